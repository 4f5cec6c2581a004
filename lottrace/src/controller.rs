use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use audit::{AuditEntry, AuditLog, ChangeEvent, ChangeFeed};
use core_types::{BatchId, BatchStatus, PrincipalId, RequestId, Role};
use ledger::{Batch, BatchLedger};
use registry::{Participant, ParticipantRegistry};
use transfer::{TransferCoordinator, TransferRequest};

use crate::{config::CustodyConfig, error::Result};

/// High-level API over the composed custody state.
///
/// Every mutating call takes the write lock for its whole duration, runs
/// all validation before any mutation, and publishes the committed audit
/// entries to the change feed before returning. Reads take the read lock
/// and clone snapshots, so they never observe a half-applied operation.
pub struct CustodyController {
    core: RwLock<Core>,
}

struct Core {
    registry: ParticipantRegistry,
    ledger: BatchLedger,
    transfers: TransferCoordinator,
    audit: AuditLog,
    feed: ChangeFeed,
}

impl Core {
    /// Drains entries the finished operation appended and pushes them to
    /// the feed, one log line per committed mutation.
    fn publish_committed(&mut self) {
        for entry in self.audit.take_pending() {
            log::info!(
                "{} batch={} actor={}",
                entry.action,
                entry.batch_id,
                entry.actor
            );
            self.feed.publish(entry);
        }
    }
}

impl CustodyController {
    pub fn bootstrap(config: CustodyConfig) -> Self {
        log::info!("custody core starting, admin={}", config.admin);
        Self {
            core: RwLock::new(Core {
                registry: ParticipantRegistry::new(config.admin),
                ledger: BatchLedger::new(),
                transfers: TransferCoordinator::new(),
                audit: AuditLog::new(),
                feed: ChangeFeed::new(config.feed_capacity),
            }),
        }
    }

    // --- participant registry ---

    pub fn register_participant(
        &self,
        caller: &PrincipalId,
        id: PrincipalId,
        role: Role,
        name: String,
        location: String,
    ) -> Result<()> {
        let mut core = self.core.write();
        core.registry
            .register(caller, id.clone(), role, name, location, Utc::now())?;
        log::info!("participant {id} registered as {role}");
        Ok(())
    }

    pub fn deactivate_participant(&self, caller: &PrincipalId, id: &PrincipalId) -> Result<()> {
        let mut core = self.core.write();
        core.registry.deactivate(caller, id)?;
        log::info!("participant {id} deactivated");
        Ok(())
    }

    pub fn is_active(&self, id: &PrincipalId) -> bool {
        self.core.read().registry.is_active(id)
    }

    pub fn participant(&self, id: &PrincipalId) -> Result<Participant> {
        Ok(self.core.read().registry.get(id)?.clone())
    }

    /// All registered participants, active and deactivated.
    pub fn participants(&self) -> Vec<Participant> {
        self.core.read().registry.iter().cloned().collect()
    }

    // --- batch ledger ---

    pub fn register_batch(
        &self,
        caller: &PrincipalId,
        batch_type: String,
        quantity: u64,
        origin: String,
        metadata_uri: String,
    ) -> Result<BatchId> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        let id = core.ledger.register_batch(
            &core.registry,
            &mut core.audit,
            caller,
            batch_type,
            quantity,
            origin,
            metadata_uri,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(id)
    }

    pub fn update_status(
        &self,
        caller: &PrincipalId,
        batch_id: BatchId,
        new_status: BatchStatus,
        details: String,
        location: Option<String>,
    ) -> Result<()> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        core.ledger.update_status(
            &core.registry,
            &mut core.audit,
            caller,
            batch_id,
            new_status,
            details,
            location,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(())
    }

    pub fn batch(&self, batch_id: BatchId) -> Result<Batch> {
        Ok(self.core.read().ledger.batch(batch_id)?.clone())
    }

    pub fn ownership_history(&self, batch_id: BatchId) -> Result<Vec<PrincipalId>> {
        Ok(self.core.read().ledger.ownership_history(batch_id)?.to_vec())
    }

    pub fn audit_trail(&self, batch_id: BatchId) -> Result<Vec<AuditEntry>> {
        let core = self.core.read();
        core.ledger.batch(batch_id)?;
        Ok(core.audit.trail(batch_id).unwrap_or_default().to_vec())
    }

    pub fn total_batches(&self) -> u64 {
        self.core.read().ledger.total_batches()
    }

    pub fn batches_owned_by(&self, principal: &PrincipalId) -> Vec<Batch> {
        self.core
            .read()
            .ledger
            .batches_owned_by(principal)
            .cloned()
            .collect()
    }

    // --- custody transfer ---

    pub fn request_transfer(
        &self,
        caller: &PrincipalId,
        batch_id: BatchId,
        to: PrincipalId,
        reason: String,
        transport_details: String,
    ) -> Result<RequestId> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        let id = core.transfers.request_transfer(
            &mut core.ledger,
            &core.registry,
            &mut core.audit,
            caller,
            batch_id,
            to,
            reason,
            transport_details,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(id)
    }

    pub fn accept_transfer(&self, caller: &PrincipalId, request_id: RequestId) -> Result<()> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        core.transfers.accept_transfer(
            &mut core.ledger,
            &mut core.audit,
            caller,
            request_id,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(())
    }

    pub fn reject_transfer(
        &self,
        caller: &PrincipalId,
        request_id: RequestId,
        reason: String,
    ) -> Result<()> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        core.transfers.reject_transfer(
            &mut core.ledger,
            &mut core.audit,
            caller,
            request_id,
            reason,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(())
    }

    pub fn cancel_transfer(&self, caller: &PrincipalId, request_id: RequestId) -> Result<()> {
        let mut guard = self.core.write();
        let core = &mut *guard;
        core.transfers.cancel_transfer(
            &mut core.ledger,
            &mut core.audit,
            caller,
            request_id,
            Utc::now(),
        )?;
        core.publish_committed();
        Ok(())
    }

    pub fn active_request(&self, batch_id: BatchId) -> Result<TransferRequest> {
        Ok(self.core.read().transfers.active_request(batch_id)?.clone())
    }

    pub fn transfer_request(&self, request_id: RequestId) -> Result<TransferRequest> {
        Ok(self.core.read().transfers.request(request_id)?.clone())
    }

    pub fn total_transfer_requests(&self) -> u64 {
        self.core.read().transfers.total_requests()
    }

    // --- change feed ---

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.core.read().feed.subscribe()
    }

    /// Sequence number the next committed mutation will be published under.
    pub fn feed_position(&self) -> u64 {
        self.core.read().feed.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit::AuditAction;
    use core_types::ErrorKind;

    const ADMIN: &str = "admin";

    fn controller() -> CustodyController {
        let ctl = CustodyController::bootstrap(CustodyConfig::new(ADMIN));
        for (id, role) in [("P", Role::Producer), ("R", Role::Receiver)] {
            ctl.register_participant(
                &ADMIN.to_string(),
                id.to_string(),
                role,
                format!("{id} Ltd"),
                "Site1".to_string(),
            )
            .unwrap();
        }
        ctl
    }

    fn fuel_batch(ctl: &CustodyController) -> BatchId {
        ctl.register_batch(
            &"P".to_string(),
            "FuelX".to_string(),
            1000,
            "Site1".to_string(),
            "uri://cert/1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn scenario_producer_registers_batch() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        assert_eq!(id, 1);

        let batch = ctl.batch(id).unwrap();
        assert_eq!(batch.status, BatchStatus::Created);
        assert_eq!(batch.current_owner, "P");
        assert_eq!(batch.batch_type, "FuelX");
        assert_eq!(batch.quantity, 1000);
        assert_eq!(ctl.ownership_history(id).unwrap(), ["P"]);

        let trail = ctl.audit_trail(id).unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, AuditAction::Created);
    }

    #[test]
    fn scenario_status_advances_then_refuses_rewind() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        let p = "P".to_string();

        ctl.update_status(&p, id, BatchStatus::InTransit, "loaded".into(), None)
            .unwrap();
        ctl.update_status(&p, id, BatchStatus::Delivered, "arrived".into(), None)
            .unwrap();

        let err = ctl
            .update_status(&p, id, BatchStatus::Created, "rewind".into(), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(ctl.batch(id).unwrap().status, BatchStatus::Delivered);
    }

    #[test]
    fn scenario_two_phase_transfer() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        let (p, r) = ("P".to_string(), "R".to_string());

        let request_id = ctl
            .request_transfer(&p, id, r.clone(), "ship".into(), "truck 7".into())
            .unwrap();
        assert_eq!(request_id, 1);
        assert_eq!(ctl.batch(id).unwrap().pending_owner.as_deref(), Some("R"));
        assert_eq!(ctl.active_request(id).unwrap().to, "R");

        // a second request while one is pending is refused
        let err = ctl
            .request_transfer(&p, id, r.clone(), "again".into(), String::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);

        ctl.accept_transfer(&r, request_id).unwrap();
        let batch = ctl.batch(id).unwrap();
        assert_eq!(batch.current_owner, "R");
        assert!(batch.pending_owner.is_none());
        assert_eq!(ctl.ownership_history(id).unwrap(), ["P", "R"]);
        assert!(!ctl.transfer_request(request_id).unwrap().active);
        assert!(ctl.active_request(id).is_err());
    }

    #[test]
    fn scenario_unregistered_callers() {
        let ctl = controller();
        let err = ctl
            .register_batch(
                &"U".to_string(),
                "FuelX".into(),
                1,
                "Site1".into(),
                String::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let id = fuel_batch(&ctl);
        let err = ctl
            .request_transfer(&"P".to_string(), id, "U".to_string(), "ship".into(), String::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn scenario_reject_needs_reason() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        let (p, r) = ("P".to_string(), "R".to_string());
        let request_id = ctl
            .request_transfer(&p, id, r.clone(), "ship".into(), String::new())
            .unwrap();

        let err = ctl.reject_transfer(&r, request_id, String::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        ctl.reject_transfer(&r, request_id, "no dock space".into())
            .unwrap();
        let batch = ctl.batch(id).unwrap();
        assert_eq!(batch.current_owner, "P");
        assert!(batch.pending_owner.is_none());
        assert!(!ctl.transfer_request(request_id).unwrap().active);

        // closing it a second time is a state error
        let err = ctl
            .reject_transfer(&r, request_id, "still no".into())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    // A batch rejection leaves an in-flight transfer pending, and
    // acceptance only re-validates ownership. The window is intentional
    // and observable.
    #[test]
    fn accept_still_possible_after_batch_rejected() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        let (p, r) = ("P".to_string(), "R".to_string());

        let request_id = ctl
            .request_transfer(&p, id, r.clone(), "ship".into(), String::new())
            .unwrap();
        ctl.update_status(&p, id, BatchStatus::Rejected, "failed assay".into(), None)
            .unwrap();
        assert_eq!(ctl.batch(id).unwrap().pending_owner.as_deref(), Some("R"));

        ctl.accept_transfer(&r, request_id).unwrap();
        let batch = ctl.batch(id).unwrap();
        assert_eq!(batch.status, BatchStatus::Rejected);
        assert_eq!(batch.current_owner, "R");
        assert_eq!(ctl.ownership_history(id).unwrap(), ["P", "R"]);
    }

    #[test]
    fn rejection_carries_synthetic_audit_entry() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        ctl.update_status(
            &"P".to_string(),
            id,
            BatchStatus::Rejected,
            "failed assay".into(),
            Some("Site1".into()),
        )
        .unwrap();

        let trail = ctl.audit_trail(id).unwrap();
        let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            [
                AuditAction::Created,
                AuditAction::StatusUpdated,
                AuditAction::BatchRejected
            ]
        );
        assert_eq!(trail[2].details, "failed assay");
    }

    #[tokio::test]
    async fn feed_publishes_after_commit_in_order() {
        let ctl = controller();
        let mut rx = ctl.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));

        let id = fuel_batch(&ctl);
        ctl.update_status(
            &"P".to_string(),
            id,
            BatchStatus::Rejected,
            "failed".into(),
            None,
        )
        .unwrap();

        let expected = [
            AuditAction::Created,
            AuditAction::StatusUpdated,
            AuditAction::BatchRejected,
        ];
        for (seq, action) in expected.iter().enumerate() {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.seq, seq as u64);
            assert_eq!(event.entry.action, *action);
            assert_eq!(event.entry.batch_id, id);
        }
        assert_eq!(ctl.feed_position(), 3);
    }

    #[test]
    fn failed_operations_emit_nothing() {
        let ctl = controller();
        let mut rx = ctl.subscribe();

        let err = ctl
            .register_batch(
                &"P".to_string(),
                String::new(),
                1,
                "Site1".into(),
                String::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ctl.feed_position(), 0);
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(ctl.total_batches(), 0);
    }

    #[test]
    fn ownership_invariant_holds_across_transfers() {
        let ctl = controller();
        ctl.register_participant(
            &ADMIN.to_string(),
            "D".to_string(),
            Role::Distributor,
            "D Ltd".to_string(),
            "Hub".to_string(),
        )
        .unwrap();
        let id = fuel_batch(&ctl);
        let (p, r, d) = ("P".to_string(), "R".to_string(), "D".to_string());

        let req = ctl
            .request_transfer(&p, id, d.clone(), "to hub".into(), String::new())
            .unwrap();
        ctl.accept_transfer(&d, req).unwrap();
        let req = ctl
            .request_transfer(&d, id, r.clone(), "to receiver".into(), String::new())
            .unwrap();
        ctl.accept_transfer(&r, req).unwrap();

        let history = ctl.ownership_history(id).unwrap();
        let accepted = ctl
            .audit_trail(id)
            .unwrap()
            .iter()
            .filter(|e| e.action == AuditAction::TransferAccepted)
            .count();
        assert_eq!(history.len(), accepted + 1);
        assert_eq!(history.last().unwrap(), &ctl.batch(id).unwrap().current_owner);
        assert_eq!(ctl.total_transfer_requests(), 2);
        assert_eq!(ctl.batches_owned_by(&r).len(), 1);
        assert!(ctl.batches_owned_by(&p).is_empty());
    }

    #[test]
    fn deactivated_participant_cannot_receive_custody() {
        let ctl = controller();
        let id = fuel_batch(&ctl);
        ctl.deactivate_participant(&ADMIN.to_string(), &"R".to_string())
            .unwrap();

        let err = ctl
            .request_transfer(
                &"P".to_string(),
                id,
                "R".to_string(),
                "ship".into(),
                String::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn audit_trail_unknown_batch_is_not_found() {
        let ctl = controller();
        assert_eq!(ctl.audit_trail(7).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(ctl.batch(7).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
