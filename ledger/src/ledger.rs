use std::collections::HashMap;

use audit::{AuditAction, AuditEntry, AuditLog};
use chrono::{DateTime, Utc};
use core_types::{BatchId, BatchStatus, PrincipalId, Role};
use registry::ParticipantRegistry;

use crate::{
    batch::Batch,
    error::{LedgerError, Result},
    history::OwnershipHistory,
};

/// Keyed batch store: monotonic id counter plus an index from id to
/// record. All operations validate fully before touching any state, so a
/// returned error implies no mutation happened.
#[derive(Debug)]
pub struct BatchLedger {
    batches: HashMap<BatchId, Batch>,
    history: OwnershipHistory,
    next_id: BatchId,
}

impl Default for BatchLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchLedger {
    pub fn new() -> Self {
        Self {
            batches: HashMap::new(),
            history: OwnershipHistory::new(),
            next_id: 1,
        }
    }

    /// Registers a new batch owned by its creator, opens its ownership
    /// history, and records the CREATED audit entry.
    pub fn register_batch(
        &mut self,
        registry: &ParticipantRegistry,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        batch_type: String,
        quantity: u64,
        origin: String,
        metadata_uri: String,
        now: DateTime<Utc>,
    ) -> Result<BatchId> {
        if !registry.is_active(caller) {
            return Err(LedgerError::NotRegistered {
                caller: caller.clone(),
            });
        }
        if batch_type.is_empty() {
            return Err(LedgerError::EmptyBatchType);
        }
        if origin.is_empty() {
            return Err(LedgerError::EmptyOrigin);
        }
        if quantity == 0 {
            return Err(LedgerError::ZeroQuantity);
        }

        let id = self.next_id;
        self.next_id += 1;

        let details = format!("batch {batch_type} registered, quantity {quantity}");
        let batch = Batch::new(
            id,
            caller.clone(),
            batch_type,
            quantity,
            origin.clone(),
            metadata_uri,
            now,
        );
        self.batches.insert(id, batch);
        self.history.open(id, caller.clone());
        audit_log.append(AuditEntry {
            batch_id: id,
            actor: caller.clone(),
            action: AuditAction::Created,
            details,
            at: now,
            location: Some(origin),
        });
        Ok(id)
    }

    /// Advances a batch along the lifecycle table. Only the current owner
    /// or an active overseer may do this. A move to `Rejected` records a
    /// second, synthetic BATCH_REJECTED entry carrying the reason.
    ///
    /// An in-flight pending transfer is left untouched, even on rejection:
    /// acceptance re-validates ownership, not batch status.
    pub fn update_status(
        &mut self,
        registry: &ParticipantRegistry,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        batch_id: BatchId,
        new_status: BatchStatus,
        details: String,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or(LedgerError::UnknownBatch { batch_id })?;
        if !batch.is_owned_by(caller) && !registry.has_active_role(caller, Role::Overseer) {
            return Err(LedgerError::NotAuthorized {
                caller: caller.clone(),
                batch_id,
            });
        }
        if !batch.status.can_transition_to(new_status) {
            return Err(LedgerError::IllegalTransition {
                from: batch.status,
                to: new_status,
            });
        }

        let from = batch.status;
        batch.status = new_status;
        batch.updated_at = now;

        audit_log.append(AuditEntry {
            batch_id,
            actor: caller.clone(),
            action: AuditAction::StatusUpdated,
            details: format!("{from} -> {new_status}: {details}"),
            at: now,
            location: location.clone(),
        });
        if new_status == BatchStatus::Rejected {
            audit_log.append(AuditEntry {
                batch_id,
                actor: caller.clone(),
                action: AuditAction::BatchRejected,
                details,
                at: now,
                location,
            });
        }
        Ok(())
    }

    pub fn batch(&self, batch_id: BatchId) -> Result<&Batch> {
        self.batches
            .get(&batch_id)
            .ok_or(LedgerError::UnknownBatch { batch_id })
    }

    pub fn ownership_history(&self, batch_id: BatchId) -> Result<&[PrincipalId]> {
        self.history
            .owners(batch_id)
            .ok_or(LedgerError::UnknownBatch { batch_id })
    }

    pub fn total_batches(&self) -> u64 {
        self.next_id - 1
    }

    pub fn batches_owned_by<'a>(
        &'a self,
        principal: &'a PrincipalId,
    ) -> impl Iterator<Item = &'a Batch> {
        self.batches.values().filter(move |b| b.is_owned_by(principal))
    }

    /// Marks a transfer in flight. The transfer coordinator validates
    /// before calling; the batch must exist and carry no pending owner.
    pub fn set_pending_owner(
        &mut self,
        batch_id: BatchId,
        to: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let batch = self.batch_mut(batch_id)?;
        batch.pending_owner = Some(to);
        batch.updated_at = now;
        Ok(())
    }

    /// Clears an in-flight transfer without changing custody.
    pub fn clear_pending_owner(&mut self, batch_id: BatchId, now: DateTime<Utc>) -> Result<()> {
        let batch = self.batch_mut(batch_id)?;
        batch.pending_owner = None;
        batch.updated_at = now;
        Ok(())
    }

    /// Hands custody to the accepted recipient and appends the ownership
    /// history entry. The single place ownership changes after creation.
    pub fn complete_transfer(
        &mut self,
        batch_id: BatchId,
        new_owner: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let batch = self.batch_mut(batch_id)?;
        batch.current_owner = new_owner.clone();
        batch.pending_owner = None;
        batch.updated_at = now;
        self.history.append(batch_id, new_owner);
        Ok(())
    }

    fn batch_mut(&mut self, batch_id: BatchId) -> Result<&mut Batch> {
        self.batches
            .get_mut(&batch_id)
            .ok_or(LedgerError::UnknownBatch { batch_id })
    }
}
