use serde::{Deserialize, Serialize};

/// Coarse classification shared by every component error type, so
/// collaborator layers can map failures without matching on variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed, empty, or zero-valued input.
    Validation,
    /// Caller lacks the required role or ownership.
    Authorization,
    /// Illegal lifecycle transition or reuse of a closed request.
    State,
    /// Unknown batch, participant, or request id.
    NotFound,
    /// Duplicate registration of an active identity.
    Conflict,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::State => "state",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
        };
        f.write_str(label)
    }
}
