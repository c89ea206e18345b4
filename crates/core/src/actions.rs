//! Closed action families announced through the dispatcher.
//!
//! Each entity family has its own enum so a handler can only announce an
//! action that exists for that family. [`DomainAction`] unifies them for
//! subscribers.

use serde::Serialize;

string_enum! {
    pub enum ProjectAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        StatusChanged => "status_changed",
        ProgressUpdated => "progress_updated",
    }
}

string_enum! {
    pub enum MilestoneAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        StatusChanged => "status_changed",
        Completed => "completed",
        Reordered => "reordered",
    }
}

string_enum! {
    pub enum DeliverableAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        StatusChanged => "status_changed",
        Approved => "approved",
        Rejected => "rejected",
        FileUploaded => "file_uploaded",
        FileDownloaded => "file_downloaded",
        FileDeleted => "file_deleted",
    }
}

string_enum! {
    pub enum MeetingAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        Scheduled => "scheduled",
        Rescheduled => "rescheduled",
        Completed => "completed",
        Cancelled => "cancelled",
        NotesAdded => "notes_added",
    }
}

string_enum! {
    pub enum CredentialAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        Accessed => "accessed",
    }
}

string_enum! {
    pub enum CommentAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        MentionedUsers => "mentioned_users",
    }
}

string_enum! {
    pub enum ClientAction {
        Created => "created",
        Updated => "updated",
        Deleted => "deleted",
        InvitationSent => "invitation_sent",
    }
}

// ---------------------------------------------------------------------------
// DomainAction
// ---------------------------------------------------------------------------

/// Any action from any family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "family", content = "action", rename_all = "snake_case")]
pub enum DomainAction {
    Project(ProjectAction),
    Milestone(MilestoneAction),
    Deliverable(DeliverableAction),
    Meeting(MeetingAction),
    Credential(CredentialAction),
    Comment(CommentAction),
    Client(ClientAction),
}

impl DomainAction {
    /// The bare action name, e.g. `"file_uploaded"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainAction::Project(a) => a.as_str(),
            DomainAction::Milestone(a) => a.as_str(),
            DomainAction::Deliverable(a) => a.as_str(),
            DomainAction::Meeting(a) => a.as_str(),
            DomainAction::Credential(a) => a.as_str(),
            DomainAction::Comment(a) => a.as_str(),
            DomainAction::Client(a) => a.as_str(),
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            DomainAction::Project(_) => "project",
            DomainAction::Milestone(_) => "milestone",
            DomainAction::Deliverable(_) => "deliverable",
            DomainAction::Meeting(_) => "meeting",
            DomainAction::Credential(_) => "credential",
            DomainAction::Comment(_) => "comment",
            DomainAction::Client(_) => "client",
        }
    }
}

impl std::fmt::Display for DomainAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.family(), self.as_str())
    }
}

macro_rules! impl_from_family {
    ($($family:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$family> for DomainAction {
                fn from(action: $family) -> Self {
                    DomainAction::$variant(action)
                }
            }
        )+
    };
}

impl_from_family! {
    ProjectAction => Project,
    MilestoneAction => Milestone,
    DeliverableAction => Deliverable,
    MeetingAction => Meeting,
    CredentialAction => Credential,
    CommentAction => Comment,
    ClientAction => Client,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliverable_family_has_nine_members() {
        assert_eq!(DeliverableAction::ALL.len(), 9);
    }

    #[test]
    fn display_includes_family() {
        let action: DomainAction = DeliverableAction::FileUploaded.into();
        assert_eq!(action.to_string(), "deliverable.file_uploaded");
        assert_eq!(action.as_str(), "file_uploaded");
    }

    #[test]
    fn serializes_with_family_tag() {
        let json = serde_json::to_value(DomainAction::from(MeetingAction::Rescheduled)).unwrap();
        assert_eq!(json["family"], "meeting");
        assert_eq!(json["action"], "rescheduled");
    }
}
