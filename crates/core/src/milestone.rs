//! Milestone status transitions.

use crate::actions::MilestoneAction;
use crate::types::Timestamp;

string_enum! {
    pub enum MilestoneStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

/// `completed_at` after moving to `status`.
///
/// Set iff the status is COMPLETED; an existing stamp is kept so that a
/// repeated COMPLETED does not move it.
pub fn completed_at_for(
    status: MilestoneStatus,
    current: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match status {
        MilestoneStatus::Completed => Some(current.unwrap_or(now)),
        _ => None,
    }
}

/// Actions to announce for a status update from `from` to `to`.
///
/// A no-op update announces nothing. Landing on COMPLETED additionally
/// announces [`MilestoneAction::Completed`], which is what notifies the client.
pub fn status_change_actions(from: MilestoneStatus, to: MilestoneStatus) -> Vec<MilestoneAction> {
    if from == to {
        return Vec::new();
    }
    let mut actions = vec![MilestoneAction::StatusChanged];
    if to == MilestoneStatus::Completed {
        actions.push(MilestoneAction::Completed);
    }
    actions
}
