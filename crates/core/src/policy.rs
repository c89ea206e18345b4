//! Authorization policies.
//!
//! Every check is a pure function of the actor, the ability and the facts
//! resolved about the resource. Admins are allowed first; for clients each
//! ability is listed explicitly and anything not granted below is denied.
//! Client access always resolves through the owning project's client.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::UserId;

/// The user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Ownership facts of a resource, resolved through its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectScope {
    /// The project's client, if any.
    pub client_id: Option<UserId>,
}

impl ProjectScope {
    pub fn owned_by(client_id: Option<UserId>) -> Self {
        Self { client_id }
    }

    fn is_owner(&self, actor: &Actor) -> bool {
        self.client_id == Some(actor.id)
    }
}

fn owns(actor: &Actor, scope: Option<&ProjectScope>) -> bool {
    scope.is_some_and(|s| s.is_owner(actor))
}

/// Convert a policy decision into a `Forbidden` error.
pub fn ensure(allowed: bool) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Forbidden("forbidden".into()))
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAbility {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    ChangeStatus,
    UpdateProgress,
}

pub fn can_project(actor: &Actor, ability: ProjectAbility, scope: Option<&ProjectScope>) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        ProjectAbility::ViewAny => true,
        ProjectAbility::View => owns(actor, scope),
        ProjectAbility::Create
        | ProjectAbility::Update
        | ProjectAbility::Delete
        | ProjectAbility::ChangeStatus
        | ProjectAbility::UpdateProgress => false,
    }
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneAbility {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    ChangeStatus,
    Reorder,
}

pub fn can_milestone(
    actor: &Actor,
    ability: MilestoneAbility,
    scope: Option<&ProjectScope>,
) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        MilestoneAbility::ViewAny => true,
        MilestoneAbility::View => owns(actor, scope),
        MilestoneAbility::Create
        | MilestoneAbility::Update
        | MilestoneAbility::Delete
        | MilestoneAbility::ChangeStatus
        | MilestoneAbility::Reorder => false,
    }
}

// ---------------------------------------------------------------------------
// Deliverables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverableAbility {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    ChangeStatus,
    Approve,
    Reject,
    UploadFile,
    DownloadFile,
    DeleteFile,
}

pub fn can_deliverable(
    actor: &Actor,
    ability: DeliverableAbility,
    scope: Option<&ProjectScope>,
) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        DeliverableAbility::ViewAny => true,
        DeliverableAbility::View
        | DeliverableAbility::Approve
        | DeliverableAbility::Reject
        | DeliverableAbility::DownloadFile => owns(actor, scope),
        DeliverableAbility::Create
        | DeliverableAbility::Update
        | DeliverableAbility::Delete
        | DeliverableAbility::ChangeStatus
        | DeliverableAbility::UploadFile
        | DeliverableAbility::DeleteFile => false,
    }
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingAbility {
    ViewAny,
    View,
    Create,
    Update,
    Reschedule,
    Cancel,
    AddNotes,
    Complete,
    Delete,
}

pub fn can_meeting(actor: &Actor, ability: MeetingAbility, scope: Option<&ProjectScope>) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        MeetingAbility::ViewAny => true,
        MeetingAbility::View
        | MeetingAbility::Create
        | MeetingAbility::Update
        | MeetingAbility::Reschedule
        | MeetingAbility::Cancel
        | MeetingAbility::AddNotes => owns(actor, scope),
        MeetingAbility::Complete | MeetingAbility::Delete => false,
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialAbility {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    Reveal,
}

pub fn can_credential(
    actor: &Actor,
    ability: CredentialAbility,
    scope: Option<&ProjectScope>,
) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        CredentialAbility::ViewAny => true,
        CredentialAbility::View => owns(actor, scope),
        CredentialAbility::Create
        | CredentialAbility::Update
        | CredentialAbility::Delete
        | CredentialAbility::Reveal => false,
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Facts about an existing comment needed by the comment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentFacts {
    pub scope: ProjectScope,
    pub author_id: UserId,
    pub is_internal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAbility<'a> {
    ViewAny,
    /// Create a top-level comment on a subject within `scope`.
    Create(&'a ProjectScope),
    CreateInternal,
    ViewInternal,
    View(&'a CommentFacts),
    Reply(&'a CommentFacts),
    Update(&'a CommentFacts),
    Delete(&'a CommentFacts),
    MarkRead(&'a CommentFacts),
}

pub fn can_comment(actor: &Actor, ability: CommentAbility<'_>) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        CommentAbility::ViewAny => true,
        CommentAbility::Create(scope) => scope.is_owner(actor),
        CommentAbility::CreateInternal | CommentAbility::ViewInternal => false,
        CommentAbility::View(c) | CommentAbility::Reply(c) | CommentAbility::MarkRead(c) => {
            !c.is_internal && c.scope.is_owner(actor)
        }
        CommentAbility::Update(c) => {
            !c.is_internal && c.author_id == actor.id && c.scope.is_owner(actor)
        }
        CommentAbility::Delete(c) => c.author_id == actor.id && c.scope.is_owner(actor),
    }
}

// ---------------------------------------------------------------------------
// Clients and audit trail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAbility {
    ViewAny,
    Create,
    ResendInvitation,
}

/// Client management is admin-only.
pub fn can_client(actor: &Actor, ability: ClientAbility) -> bool {
    if actor.is_admin() {
        return true;
    }
    match ability {
        ClientAbility::ViewAny | ClientAbility::Create | ClientAbility::ResendInvitation => false,
    }
}

/// Reading the activity log is admin-only.
pub fn can_view_activity(actor: &Actor) -> bool {
    actor.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn client() -> Actor {
        Actor::new(UserId::new(), Role::Client)
    }

    fn admin() -> Actor {
        Actor::new(UserId::new(), Role::Admin)
    }

    #[test]
    fn client_views_only_own_project() {
        let me = client();
        let mine = ProjectScope::owned_by(Some(me.id));
        let theirs = ProjectScope::owned_by(Some(UserId::new()));
        assert!(can_project(&me, ProjectAbility::View, Some(&mine)));
        assert!(!can_project(&me, ProjectAbility::View, Some(&theirs)));
        assert!(!can_project(&me, ProjectAbility::View, None));
    }

    #[test]
    fn admin_views_any_project() {
        let theirs = ProjectScope::owned_by(Some(UserId::new()));
        assert!(can_project(&admin(), ProjectAbility::View, Some(&theirs)));
        assert!(can_project(&admin(), ProjectAbility::Delete, None));
    }

    #[test]
    fn denied_check_is_forbidden() {
        let me = client();
        let theirs = ProjectScope::owned_by(None);
        assert_matches!(
            ensure(can_project(&me, ProjectAbility::View, Some(&theirs))),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn client_cannot_mutate_own_project_or_milestones() {
        let me = client();
        let mine = ProjectScope::owned_by(Some(me.id));
        for ability in [
            ProjectAbility::Create,
            ProjectAbility::Update,
            ProjectAbility::Delete,
            ProjectAbility::ChangeStatus,
            ProjectAbility::UpdateProgress,
        ] {
            assert!(!can_project(&me, ability, Some(&mine)), "{ability:?}");
        }
        for ability in [
            MilestoneAbility::Create,
            MilestoneAbility::Update,
            MilestoneAbility::Delete,
            MilestoneAbility::ChangeStatus,
            MilestoneAbility::Reorder,
        ] {
            assert!(!can_milestone(&me, ability, Some(&mine)), "{ability:?}");
        }
    }

    #[test]
    fn client_approves_and_rejects_own_deliverables_only() {
        let me = client();
        let mine = ProjectScope::owned_by(Some(me.id));
        let theirs = ProjectScope::owned_by(Some(UserId::new()));
        assert!(can_deliverable(&me, DeliverableAbility::Approve, Some(&mine)));
        assert!(can_deliverable(&me, DeliverableAbility::Reject, Some(&mine)));
        assert!(can_deliverable(&me, DeliverableAbility::DownloadFile, Some(&mine)));
        assert!(!can_deliverable(&me, DeliverableAbility::Approve, Some(&theirs)));
        assert!(!can_deliverable(&me, DeliverableAbility::Update, Some(&mine)));
        assert!(!can_deliverable(&me, DeliverableAbility::UploadFile, Some(&mine)));
    }

    #[test]
    fn client_manages_own_meetings_but_cannot_delete() {
        let me = client();
        let mine = ProjectScope::owned_by(Some(me.id));
        assert!(can_meeting(&me, MeetingAbility::Create, Some(&mine)));
        assert!(can_meeting(&me, MeetingAbility::Reschedule, Some(&mine)));
        assert!(can_meeting(&me, MeetingAbility::Cancel, Some(&mine)));
        assert!(!can_meeting(&me, MeetingAbility::Delete, Some(&mine)));
        assert!(!can_meeting(&me, MeetingAbility::Complete, Some(&mine)));
    }

    #[test]
    fn client_never_reveals_credentials() {
        let me = client();
        let mine = ProjectScope::owned_by(Some(me.id));
        assert!(can_credential(&me, CredentialAbility::View, Some(&mine)));
        assert!(!can_credential(&me, CredentialAbility::Reveal, Some(&mine)));
    }

    #[test]
    fn internal_comments_are_closed_to_clients_even_as_author() {
        let me = client();
        let facts = CommentFacts {
            scope: ProjectScope::owned_by(Some(me.id)),
            author_id: me.id,
            is_internal: true,
        };
        assert!(!can_comment(&me, CommentAbility::View(&facts)));
        assert!(!can_comment(&me, CommentAbility::Update(&facts)));
        assert!(!can_comment(&me, CommentAbility::Reply(&facts)));
        assert!(!can_comment(&me, CommentAbility::CreateInternal));
    }

    #[test]
    fn client_edits_only_own_public_comments() {
        let me = client();
        let scope = ProjectScope::owned_by(Some(me.id));
        let own = CommentFacts {
            scope,
            author_id: me.id,
            is_internal: false,
        };
        let other = CommentFacts {
            author_id: UserId::new(),
            ..own
        };
        assert!(can_comment(&me, CommentAbility::Update(&own)));
        assert!(can_comment(&me, CommentAbility::Delete(&own)));
        assert!(!can_comment(&me, CommentAbility::Update(&other)));
        assert!(!can_comment(&me, CommentAbility::Delete(&other)));
        assert!(can_comment(&me, CommentAbility::View(&other)));
    }

    #[test]
    fn client_management_is_admin_only() {
        assert!(!can_client(&client(), ClientAbility::Create));
        assert!(can_client(&admin(), ClientAbility::ResendInvitation));
        assert!(!can_view_activity(&client()));
        assert!(can_view_activity(&admin()));
    }
}
