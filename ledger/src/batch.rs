use chrono::{DateTime, Utc};
use core_types::{BatchId, BatchStatus, PrincipalId};
use serde::{Deserialize, Serialize};

/// A tracked physical lot. Created once, mutated only through status
/// updates and completed transfers, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub creator: PrincipalId,
    pub current_owner: PrincipalId,
    /// Set while a transfer request is in flight, cleared when it closes.
    pub pending_owner: Option<PrincipalId>,
    pub status: BatchStatus,
    pub batch_type: String,
    pub quantity: u64,
    pub origin: String,
    /// Opaque reference to off-core documents; never dereferenced here.
    pub metadata_uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(
        id: BatchId,
        creator: PrincipalId,
        batch_type: String,
        quantity: u64,
        origin: String,
        metadata_uri: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            current_owner: creator.clone(),
            creator,
            pending_owner: None,
            status: BatchStatus::Created,
            batch_type,
            quantity,
            origin,
            metadata_uri,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.current_owner == principal
    }
}
