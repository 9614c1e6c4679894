//! Operator/ambulance assignment reconciliation.
//!
//! An ambulance carries a set of assigned operators. Admin edits submit the
//! full desired set; `reconcile` computes the minimal link-table changes so
//! the repository can apply them without rewriting untouched rows.

use std::collections::BTreeSet;
use uuid::Uuid;

/// The link-table changes needed to move from one assignment set to another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssignmentDiff {
    /// Operator ids to link, in ascending order.
    pub to_add: Vec<Uuid>,
    /// Operator ids to unlink, in ascending order.
    pub to_remove: Vec<Uuid>,
}

impl AssignmentDiff {
    /// Returns true when no changes are needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the diff between the currently linked operators and the desired
/// set. Duplicates in either input are ignored; output ordering is
/// deterministic.
#[must_use]
pub fn reconcile(existing: &[Uuid], desired: &[Uuid]) -> AssignmentDiff {
    let existing: BTreeSet<Uuid> = existing.iter().copied().collect();
    let desired: BTreeSet<Uuid> = desired.iter().copied().collect();

    AssignmentDiff {
        to_add: desired.difference(&existing).copied().collect(),
        to_remove: existing.difference(&desired).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_no_change() {
        let ops = ids(3);
        let diff = reconcile(&ops, &ops);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_add_and_remove() {
        let keep = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let new = Uuid::new_v4();

        let diff = reconcile(&[keep, gone], &[keep, new]);
        assert_eq!(diff.to_add, vec![new]);
        assert_eq!(diff.to_remove, vec![gone]);
    }

    #[test]
    fn test_clear_all() {
        let ops = ids(2);
        let diff = reconcile(&ops, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let op = Uuid::new_v4();
        let diff = reconcile(&[], &[op, op, op]);
        assert_eq!(diff.to_add, vec![op]);
    }

    #[test]
    fn test_output_is_sorted() {
        let mut ops = ids(5);
        ops.sort_unstable();
        let shuffled = vec![ops[3], ops[0], ops[4], ops[1], ops[2]];
        let diff = reconcile(&[], &shuffled);
        assert_eq!(diff.to_add, ops);
    }
}
