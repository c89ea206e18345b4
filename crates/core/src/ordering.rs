//! Per-scope sequence numbers.
//!
//! Milestone order, deliverable order and file versions are `max + 1` within
//! a scope. The database allocator serialises allocations per scope with a
//! transaction-scoped lock keyed by [`SequenceScope::lock_key`].

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{DeliverableId, MilestoneId, ProjectId};

/// First value handed out in an empty scope.
pub const FIRST_SEQUENCE: i32 = 1;

/// The set of sibling rows a counter is local to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceScope {
    /// `milestones.sort_order` within a project.
    MilestoneOrder(ProjectId),
    /// `deliverables.sort_order` within a project and milestone (or none).
    DeliverableOrder {
        project: ProjectId,
        milestone: Option<MilestoneId>,
    },
    /// `deliverable_files.version` within a deliverable.
    FileVersion(DeliverableId),
}

impl SequenceScope {
    /// Stable key identifying the scope for locking.
    pub fn lock_key(&self) -> String {
        match self {
            SequenceScope::MilestoneOrder(project) => format!("milestone_order:{project}"),
            SequenceScope::DeliverableOrder { project, milestone } => match milestone {
                Some(m) => format!("deliverable_order:{project}:{m}"),
                None => format!("deliverable_order:{project}:none"),
            },
            SequenceScope::FileVersion(deliverable) => format!("file_version:{deliverable}"),
        }
    }
}

/// Next value after the current maximum; an empty scope yields 1.
pub fn next_in_sequence(current_max: Option<i32>) -> i32 {
    current_max.map_or(FIRST_SEQUENCE, |max| max + 1)
}

/// Check that `proposed` is a permutation of `existing`.
pub fn validate_permutation(existing: &[Uuid], proposed: &[Uuid]) -> Result<(), CoreError> {
    let existing_set: HashSet<_> = existing.iter().collect();
    let proposed_set: HashSet<_> = proposed.iter().collect();
    if proposed.len() != proposed_set.len() {
        return Err(CoreError::Validation("Order contains duplicate ids".into()));
    }
    if existing_set != proposed_set {
        return Err(CoreError::Validation(
            "Order must list every item in the scope exactly once".into(),
        ));
    }
    Ok(())
}

/// Positions for a reordered list: the first id gets 1.
pub fn positions(ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    ids.iter()
        .zip(FIRST_SEQUENCE..)
        .map(|(id, pos)| (*id, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_scope_starts_at_one() {
        assert_eq!(next_in_sequence(None), 1);
        assert_eq!(next_in_sequence(Some(4)), 5);
    }

    #[test]
    fn milestone_less_deliverables_have_their_own_scope() {
        let project = ProjectId::new();
        let with = SequenceScope::DeliverableOrder {
            project,
            milestone: Some(MilestoneId::new()),
        };
        let without = SequenceScope::DeliverableOrder {
            project,
            milestone: None,
        };
        assert_ne!(with.lock_key(), without.lock_key());
        assert!(without.lock_key().ends_with(":none"));
    }

    #[test]
    fn scopes_of_different_kinds_never_share_keys() {
        let id = Uuid::new_v4();
        let a = SequenceScope::MilestoneOrder(ProjectId(id)).lock_key();
        let b = SequenceScope::FileVersion(DeliverableId(id)).lock_key();
        assert_ne!(a, b);
    }

    #[test]
    fn permutation_must_match_exactly() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(validate_permutation(&[a, b, c], &[c, a, b]).is_ok());
        assert_matches!(validate_permutation(&[a, b, c], &[a, b]), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_permutation(&[a, b], &[a, a]),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_permutation(&[a, b], &[a, Uuid::new_v4()]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn positions_are_one_based() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(positions(&[b, a]), vec![(b, 1), (a, 2)]);
    }
}
