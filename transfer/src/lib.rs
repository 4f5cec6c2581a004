//! Two-phase custody handoff: the current owner proposes a transfer, the
//! counterparty accepts or rejects it, or the requester cancels. Custody
//! changes hands only on acceptance.

pub mod error;

use std::collections::HashMap;

use audit::{AuditAction, AuditEntry, AuditLog};
use chrono::{DateTime, Utc};
use core_types::{BatchId, PrincipalId, RequestId};
use ledger::BatchLedger;
use registry::ParticipantRegistry;
use serde::{Deserialize, Serialize};

pub use error::{Result, TransferError};

/// A custody-handoff proposal. Closed exactly once (accept, reject, or
/// cancel) and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: RequestId,
    pub batch_id: BatchId,
    pub from: PrincipalId,
    pub to: PrincipalId,
    pub reason: String,
    pub transport_details: String,
    pub requested_at: DateTime<Utc>,
    pub active: bool,
}

/// Request store plus the one-active-request-per-batch index. Operations
/// validate fully before mutating, so a returned error implies no state
/// change anywhere.
#[derive(Debug)]
pub struct TransferCoordinator {
    requests: HashMap<RequestId, TransferRequest>,
    active_by_batch: HashMap<BatchId, RequestId>,
    next_id: RequestId,
}

impl Default for TransferCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferCoordinator {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            active_by_batch: HashMap::new(),
            next_id: 1,
        }
    }

    /// Opens a transfer request and marks the batch's pending owner. A
    /// second request for the same batch fails while one is active; there
    /// is no queueing or replacement.
    pub fn request_transfer(
        &mut self,
        ledger: &mut BatchLedger,
        registry: &ParticipantRegistry,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        batch_id: BatchId,
        to: PrincipalId,
        reason: String,
        transport_details: String,
        now: DateTime<Utc>,
    ) -> Result<RequestId> {
        let batch = ledger.batch(batch_id)?;
        if !batch.is_owned_by(caller) {
            return Err(TransferError::NotOwner {
                caller: caller.clone(),
                batch_id,
            });
        }
        if &to == caller {
            return Err(TransferError::SelfTransfer);
        }
        if !registry.is_active(&to) {
            return Err(TransferError::CounterpartyNotRegistered { to });
        }
        if self.active_by_batch.contains_key(&batch_id) {
            return Err(TransferError::AlreadyPending { batch_id });
        }
        if batch.status.is_terminal() {
            return Err(TransferError::TerminalBatch {
                batch_id,
                status: batch.status,
            });
        }
        if reason.is_empty() {
            return Err(TransferError::EmptyReason);
        }

        let id = self.next_id;
        self.next_id += 1;

        let details = format!("transfer to {to} requested: {reason}");
        ledger.set_pending_owner(batch_id, to.clone(), now)?;
        self.requests.insert(
            id,
            TransferRequest {
                id,
                batch_id,
                from: caller.clone(),
                to,
                reason,
                transport_details,
                requested_at: now,
                active: true,
            },
        );
        self.active_by_batch.insert(batch_id, id);
        audit_log.append(AuditEntry {
            batch_id,
            actor: caller.clone(),
            action: AuditAction::TransferRequested,
            details,
            at: now,
            location: None,
        });
        Ok(id)
    }

    /// Completes the handoff. Re-validates that the batch's owner fields
    /// still match the request before committing; the owner-changed error
    /// covers drift between request and acceptance.
    pub fn accept_transfer(
        &mut self,
        ledger: &mut BatchLedger,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let request = self.active_request_by_id(request_id)?;
        if caller != &request.to {
            return Err(TransferError::NotRecipient {
                caller: caller.clone(),
                request_id,
            });
        }
        let (batch_id, from, to) = (request.batch_id, request.from.clone(), request.to.clone());
        let batch = ledger.batch(batch_id)?;
        if batch.current_owner != from || batch.pending_owner.as_ref() != Some(&to) {
            return Err(TransferError::OwnerChanged {
                batch_id,
                request_id,
            });
        }

        ledger.complete_transfer(batch_id, to.clone(), now)?;
        self.close(request_id, batch_id);
        audit_log.append(AuditEntry {
            batch_id,
            actor: caller.clone(),
            action: AuditAction::TransferAccepted,
            details: format!("custody moved from {from} to {to}"),
            at: now,
            location: None,
        });
        Ok(())
    }

    /// Declines the handoff; custody is unchanged. Requires a reason.
    pub fn reject_transfer(
        &mut self,
        ledger: &mut BatchLedger,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        request_id: RequestId,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let request = self.active_request_by_id(request_id)?;
        if caller != &request.to {
            return Err(TransferError::NotRecipient {
                caller: caller.clone(),
                request_id,
            });
        }
        if reason.is_empty() {
            return Err(TransferError::EmptyReason);
        }
        let batch_id = request.batch_id;

        ledger.clear_pending_owner(batch_id, now)?;
        self.close(request_id, batch_id);
        audit_log.append(AuditEntry {
            batch_id,
            actor: caller.clone(),
            action: AuditAction::TransferRejected,
            details: format!("transfer rejected: {reason}"),
            at: now,
            location: None,
        });
        Ok(())
    }

    /// Withdraws the request. Authorization is by original requester only,
    /// independent of who owns the batch at cancellation time.
    pub fn cancel_transfer(
        &mut self,
        ledger: &mut BatchLedger,
        audit_log: &mut AuditLog,
        caller: &PrincipalId,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let request = self.active_request_by_id(request_id)?;
        if caller != &request.from {
            return Err(TransferError::NotRequester {
                caller: caller.clone(),
                request_id,
            });
        }
        let batch_id = request.batch_id;

        ledger.clear_pending_owner(batch_id, now)?;
        self.close(request_id, batch_id);
        audit_log.append(AuditEntry {
            batch_id,
            actor: caller.clone(),
            action: AuditAction::TransferCancelled,
            details: "transfer cancelled by requester".to_string(),
            at: now,
            location: None,
        });
        Ok(())
    }

    /// The batch's in-flight request, if any.
    pub fn active_request(&self, batch_id: BatchId) -> Result<&TransferRequest> {
        let id = self
            .active_by_batch
            .get(&batch_id)
            .ok_or(TransferError::NoActiveRequest { batch_id })?;
        Ok(&self.requests[id])
    }

    /// Any request by id, active or closed. Closed requests stay readable.
    pub fn request(&self, request_id: RequestId) -> Result<&TransferRequest> {
        self.requests
            .get(&request_id)
            .ok_or(TransferError::UnknownRequest { request_id })
    }

    pub fn total_requests(&self) -> u64 {
        self.next_id - 1
    }

    fn active_request_by_id(&self, request_id: RequestId) -> Result<&TransferRequest> {
        let request = self
            .requests
            .get(&request_id)
            .ok_or(TransferError::UnknownRequest { request_id })?;
        if !request.active {
            return Err(TransferError::RequestInactive { request_id });
        }
        Ok(request)
    }

    fn close(&mut self, request_id: RequestId, batch_id: BatchId) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.active = false;
        }
        self.active_by_batch.remove(&batch_id);
    }
}
