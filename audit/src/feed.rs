use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::AuditEntry;

/// One committed mutation, as delivered to feed subscribers. `seq` is a
/// monotonic position marker; a gap means the subscriber lagged and should
/// reconcile from the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub seq: u64,
    pub entry: AuditEntry,
}

/// Broadcast fan-out of committed audit entries. Sending never blocks; a
/// subscriber that falls behind the channel capacity observes `Lagged`.
#[derive(Debug)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
    next_seq: u64,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, next_seq: 0 }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Assigns the next sequence number and publishes. A send error only
    /// means no subscriber is currently connected; the sequence still
    /// advances so later subscribers can detect the gap.
    pub fn publish(&mut self, entry: AuditEntry) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let _ = self.tx.send(ChangeEvent { seq, entry });
        seq
    }

    /// Sequence number the next published event will carry.
    pub fn position(&self) -> u64 {
        self.next_seq
    }
}
