//! Identifiers, timestamps and polymorphic entity references.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

entity_id!(
    /// Identifier of a `users` row (clients and admins).
    UserId
);
entity_id!(ProjectId);
entity_id!(MilestoneId);
entity_id!(DeliverableId);
entity_id!(DeliverableFileId);
entity_id!(MeetingId);
entity_id!(CredentialId);
entity_id!(CommentId);
entity_id!(NotificationId);

string_enum! {
    /// Kind tag stored in the `*_type` column of a polymorphic reference.
    pub enum EntityKind {
        Project => "project",
        Milestone => "milestone",
        Deliverable => "deliverable",
        DeliverableFile => "deliverable_file",
        Meeting => "meeting",
        Credential => "credential",
        Comment => "comment",
        User => "user",
    }
}

impl EntityKind {
    /// Human-readable name used in activity descriptions.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::Milestone => "Milestone",
            EntityKind::Deliverable => "Deliverable",
            EntityKind::DeliverableFile => "DeliverableFile",
            EntityKind::Meeting => "Meeting",
            EntityKind::Credential => "Credential",
            EntityKind::Comment => "Comment",
            EntityKind::User => "User",
        }
    }
}

// ---------------------------------------------------------------------------
// EntityRef
// ---------------------------------------------------------------------------

/// A reference to any entity that can be the subject or causer of an
/// activity, the subject of a notification, or the target of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Project(ProjectId),
    Milestone(MilestoneId),
    Deliverable(DeliverableId),
    DeliverableFile(DeliverableFileId),
    Meeting(MeetingId),
    Credential(CredentialId),
    Comment(CommentId),
    User(UserId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Project(_) => EntityKind::Project,
            EntityRef::Milestone(_) => EntityKind::Milestone,
            EntityRef::Deliverable(_) => EntityKind::Deliverable,
            EntityRef::DeliverableFile(_) => EntityKind::DeliverableFile,
            EntityRef::Meeting(_) => EntityKind::Meeting,
            EntityRef::Credential(_) => EntityKind::Credential,
            EntityRef::Comment(_) => EntityKind::Comment,
            EntityRef::User(_) => EntityKind::User,
        }
    }

    /// The raw identifier, as stored in the `*_id` column.
    pub fn id(&self) -> Uuid {
        match self {
            EntityRef::Project(id) => id.0,
            EntityRef::Milestone(id) => id.0,
            EntityRef::Deliverable(id) => id.0,
            EntityRef::DeliverableFile(id) => id.0,
            EntityRef::Meeting(id) => id.0,
            EntityRef::Credential(id) => id.0,
            EntityRef::Comment(id) => id.0,
            EntityRef::User(id) => id.0,
        }
    }

    /// Rebuild a reference from its stored `(type, id)` pair.
    pub fn from_parts(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::Project => EntityRef::Project(id.into()),
            EntityKind::Milestone => EntityRef::Milestone(id.into()),
            EntityKind::Deliverable => EntityRef::Deliverable(id.into()),
            EntityKind::DeliverableFile => EntityRef::DeliverableFile(id.into()),
            EntityKind::Meeting => EntityRef::Meeting(id.into()),
            EntityKind::Credential => EntityRef::Credential(id.into()),
            EntityKind::Comment => EntityRef::Comment(id.into()),
            EntityKind::User => EntityRef::User(id.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Commentable
// ---------------------------------------------------------------------------

/// The subset of entities a comment can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Commentable {
    Project(ProjectId),
    Milestone(MilestoneId),
    Deliverable(DeliverableId),
}

impl Commentable {
    pub fn kind(&self) -> EntityKind {
        EntityRef::from(*self).kind()
    }

    pub fn id(&self) -> Uuid {
        EntityRef::from(*self).id()
    }

    /// Rebuild from a stored `(type, id)` pair, rejecting kinds that cannot
    /// carry comments.
    pub fn from_parts(kind: EntityKind, id: Uuid) -> Option<Self> {
        match kind {
            EntityKind::Project => Some(Commentable::Project(id.into())),
            EntityKind::Milestone => Some(Commentable::Milestone(id.into())),
            EntityKind::Deliverable => Some(Commentable::Deliverable(id.into())),
            _ => None,
        }
    }
}

impl From<Commentable> for EntityRef {
    fn from(c: Commentable) -> Self {
        match c {
            Commentable::Project(id) => EntityRef::Project(id),
            Commentable::Milestone(id) => EntityRef::Milestone(id),
            Commentable::Deliverable(id) => EntityRef::Deliverable(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_round_trips_through_parts() {
        let id = Uuid::new_v4();
        for kind in EntityKind::ALL {
            let r = EntityRef::from_parts(*kind, id);
            assert_eq!(r.kind(), *kind);
            assert_eq!(r.id(), id);
        }
    }

    #[test]
    fn entity_ref_serializes_as_tagged_pair() {
        let id = ProjectId::new();
        let json = serde_json::to_value(EntityRef::Project(id)).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn commentable_rejects_non_commentable_kinds() {
        let id = Uuid::new_v4();
        assert!(Commentable::from_parts(EntityKind::Meeting, id).is_none());
        assert!(Commentable::from_parts(EntityKind::User, id).is_none());
        assert_eq!(
            Commentable::from_parts(EntityKind::Deliverable, id),
            Some(Commentable::Deliverable(DeliverableId(id)))
        );
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let err = "invoice".parse::<EntityKind>().unwrap_err();
        assert!(err.to_string().contains("Invalid EntityKind"));
    }

    #[test]
    fn display_name_is_pascal_case() {
        assert_eq!(EntityKind::DeliverableFile.display_name(), "DeliverableFile");
        assert_eq!(EntityKind::Project.display_name(), "Project");
    }
}
