use std::collections::HashMap;

use core_types::{BatchId, PrincipalId};

/// Append-only owner sequence per batch. The first entry is always the
/// creator; each accepted transfer appends exactly one entry.
#[derive(Debug, Default)]
pub struct OwnershipHistory {
    owners: HashMap<BatchId, Vec<PrincipalId>>,
}

impl OwnershipHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a batch's history with its creator.
    pub fn open(&mut self, batch_id: BatchId, creator: PrincipalId) {
        self.owners.entry(batch_id).or_default().push(creator);
    }

    /// Records a completed custody change.
    pub fn append(&mut self, batch_id: BatchId, new_owner: PrincipalId) {
        self.owners.entry(batch_id).or_default().push(new_owner);
    }

    pub fn owners(&self, batch_id: BatchId) -> Option<&[PrincipalId]> {
        self.owners.get(&batch_id).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_first_then_each_acceptance() {
        let mut history = OwnershipHistory::new();
        history.open(1, "p".to_string());
        history.append(1, "r".to_string());
        history.append(1, "c".to_string());

        assert_eq!(history.owners(1).unwrap(), ["p", "r", "c"]);
        assert!(history.owners(2).is_none());
    }
}
