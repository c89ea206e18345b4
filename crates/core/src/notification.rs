//! Notification decision table and payload templates.
//!
//! [`rule_for`] is the complete list of (subject, action) pairs that notify
//! anyone. Every other combination returns `None`; new triggers must be added
//! here explicitly.

use serde_json::{json, Map, Value};

use crate::actions::{CommentAction, DeliverableAction, DomainAction, MeetingAction, MilestoneAction};
use crate::types::EntityRef;

string_enum! {
    pub enum NotificationType {
        Deliverable => "deliverable",
        Milestone => "milestone",
        Meeting => "meeting",
        Comment => "comment",
    }
}

/// Who receives a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    /// The client of the subject's project, when the project has one.
    ProjectClient,
    /// Every user in the event's `mentioned_users` except the actor.
    MentionedUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    DeliverableApproved,
    DeliverableRejected,
    MilestoneCompleted,
    MeetingScheduled,
    MeetingRescheduled,
    CommentMention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationRule {
    pub notification_type: NotificationType,
    pub recipients: Recipients,
    pub template: Template,
}

const fn rule(
    notification_type: NotificationType,
    recipients: Recipients,
    template: Template,
) -> NotificationRule {
    NotificationRule {
        notification_type,
        recipients,
        template,
    }
}

/// Look up the notification rule for an action on a subject.
pub fn rule_for(subject: &EntityRef, action: &DomainAction) -> Option<NotificationRule> {
    use NotificationType as T;
    use Recipients::*;

    match (subject, action) {
        (EntityRef::Deliverable(_), DomainAction::Deliverable(DeliverableAction::Approved)) => {
            Some(rule(T::Deliverable, ProjectClient, Template::DeliverableApproved))
        }
        (EntityRef::Deliverable(_), DomainAction::Deliverable(DeliverableAction::Rejected)) => {
            Some(rule(T::Deliverable, ProjectClient, Template::DeliverableRejected))
        }
        (EntityRef::Milestone(_), DomainAction::Milestone(MilestoneAction::Completed)) => {
            Some(rule(T::Milestone, ProjectClient, Template::MilestoneCompleted))
        }
        (EntityRef::Meeting(_), DomainAction::Meeting(MeetingAction::Scheduled)) => {
            Some(rule(T::Meeting, ProjectClient, Template::MeetingScheduled))
        }
        (EntityRef::Meeting(_), DomainAction::Meeting(MeetingAction::Rescheduled)) => {
            Some(rule(T::Meeting, ProjectClient, Template::MeetingRescheduled))
        }
        (EntityRef::Comment(_), DomainAction::Comment(CommentAction::MentionedUsers)) => {
            Some(rule(T::Comment, MentionedUsers, Template::CommentMention))
        }
        _ => None,
    }
}

impl Template {
    /// Build the notification payload.
    ///
    /// `actor_name` is the user who performed the action; `metadata` is the
    /// dispatched metadata map.
    pub fn render(&self, actor_name: &str, metadata: &Map<String, Value>) -> Value {
        match self {
            Template::DeliverableApproved => json!({
                "message": "Your deliverable has been approved",
                "approved_by": actor_name,
            }),
            Template::DeliverableRejected => json!({
                "message": "Your deliverable has been rejected",
                "rejected_by": actor_name,
                "feedback": metadata.get("feedback").cloned().unwrap_or(Value::Null),
            }),
            Template::MilestoneCompleted => json!({
                "message": "A milestone has been completed",
            }),
            Template::MeetingScheduled => json!({
                "message": "A meeting has been scheduled",
                "scheduled_by": actor_name,
            }),
            Template::MeetingRescheduled => json!({
                "message": "A meeting has been rescheduled",
                "rescheduled_by": actor_name,
            }),
            Template::CommentMention => json!({
                "message": format!("{actor_name} mentioned you in a comment"),
                "commenter": actor_name,
            }),
        }
    }
}
