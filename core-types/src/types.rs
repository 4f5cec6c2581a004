use serde::{Deserialize, Serialize};

/// Opaque principal identifier handed to the core by the authentication
/// layer. The core never inspects its structure.
pub type PrincipalId = String;

/// Monotonically assigned batch identifier. Never reused.
pub type BatchId = u64;

/// Monotonically assigned transfer-request identifier. Never reused.
pub type RequestId = u64;

/// Closed set of participant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Producer,
    Distributor,
    Receiver,
    Overseer,
    Consumer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Distributor => "distributor",
            Role::Receiver => "receiver",
            Role::Overseer => "overseer",
            Role::Consumer => "consumer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
