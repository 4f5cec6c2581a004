//! Append-only audit trail, keyed by batch id, plus the outbound change
//! feed consumed by presentation layers.
//!
//! Entries are written exclusively as side effects of ledger and transfer
//! operations; there is no external mutation surface. Appends land in a
//! pending buffer first and are published to the feed only after the
//! owning operation has committed.

mod feed;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use core_types::{BatchId, PrincipalId};
use serde::{Deserialize, Serialize};

pub use feed::{ChangeEvent, ChangeFeed};

/// Closed set of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Created,
    StatusUpdated,
    TransferRequested,
    TransferAccepted,
    TransferRejected,
    TransferCancelled,
    BatchRejected,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "CREATED",
            AuditAction::StatusUpdated => "STATUS_UPDATED",
            AuditAction::TransferRequested => "TRANSFER_REQUESTED",
            AuditAction::TransferAccepted => "TRANSFER_ACCEPTED",
            AuditAction::TransferRejected => "TRANSFER_REJECTED",
            AuditAction::TransferCancelled => "TRANSFER_CANCELLED",
            AuditAction::BatchRejected => "BATCH_REJECTED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record of a state-mutating action on a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub batch_id: BatchId,
    pub actor: PrincipalId,
    pub action: AuditAction,
    pub details: String,
    pub at: DateTime<Utc>,
    pub location: Option<String>,
}

/// Per-batch append-only trails plus the pending buffer of entries not yet
/// published to the feed.
#[derive(Debug, Default)]
pub struct AuditLog {
    trails: HashMap<BatchId, Vec<AuditEntry>>,
    pending: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the batch's trail and stages the entry for publication.
    pub fn append(&mut self, entry: AuditEntry) {
        self.trails
            .entry(entry.batch_id)
            .or_default()
            .push(entry.clone());
        self.pending.push(entry);
    }

    /// Full ordered trail for a batch, or `None` for an unknown batch.
    pub fn trail(&self, batch_id: BatchId) -> Option<&[AuditEntry]> {
        self.trails.get(&batch_id).map(Vec::as_slice)
    }

    /// Drains entries staged since the last drain. Called once per
    /// committed operation, in commit order.
    pub fn take_pending(&mut self) -> Vec<AuditEntry> {
        std::mem::take(&mut self.pending)
    }

}
