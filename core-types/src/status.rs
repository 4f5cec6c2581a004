use serde::{Deserialize, Serialize};

/// Batch lifecycle status. `Created` is the unique initial state;
/// `Rejected` and `Consumed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Created,
    InTransit,
    Delivered,
    QualityTested,
    Approved,
    Rejected,
    Consumed,
}

impl BatchStatus {
    /// Legal successor states. The lifecycle only moves forward; there is
    /// no edge back to an earlier state and no self-edge.
    pub fn successors(&self) -> &'static [BatchStatus] {
        match self {
            BatchStatus::Created => &[BatchStatus::InTransit, BatchStatus::Rejected],
            BatchStatus::InTransit => &[BatchStatus::Delivered, BatchStatus::Rejected],
            BatchStatus::Delivered => &[BatchStatus::QualityTested, BatchStatus::Rejected],
            BatchStatus::QualityTested => &[BatchStatus::Approved, BatchStatus::Rejected],
            BatchStatus::Approved => &[BatchStatus::Consumed],
            BatchStatus::Rejected | BatchStatus::Consumed => &[],
        }
    }

    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "created",
            BatchStatus::InTransit => "in_transit",
            BatchStatus::Delivered => "delivered",
            BatchStatus::QualityTested => "quality_tested",
            BatchStatus::Approved => "approved",
            BatchStatus::Rejected => "rejected",
            BatchStatus::Consumed => "consumed",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BatchStatus::*;

    #[test]
    fn lifecycle_moves_forward_only() {
        assert!(Created.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(QualityTested));
        assert!(QualityTested.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Consumed));

        assert!(!InTransit.can_transition_to(Created));
        assert!(!Delivered.can_transition_to(InTransit));
        assert!(!Approved.can_transition_to(QualityTested));
    }

    #[test]
    fn no_self_edges() {
        for status in [
            Created,
            InTransit,
            Delivered,
            QualityTested,
            Approved,
            Rejected,
            Consumed,
        ] {
            assert!(!status.can_transition_to(status), "{status} has a self-edge");
        }
    }

    #[test]
    fn rejection_reachable_until_approval() {
        assert!(Created.can_transition_to(Rejected));
        assert!(InTransit.can_transition_to(Rejected));
        assert!(Delivered.can_transition_to(Rejected));
        assert!(QualityTested.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn terminal_states_have_no_exit() {
        assert!(Rejected.is_terminal());
        assert!(Consumed.is_terminal());
        assert!(!Approved.is_terminal());
    }
}
