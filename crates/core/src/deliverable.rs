//! Deliverable types, statuses, approval stamps and file naming.

use uuid::Uuid;

use crate::types::{ProjectId, Timestamp, UserId};

string_enum! {
    pub enum DeliverableType {
        File => "file",
        Link => "link",
        Text => "text",
        Code => "code",
        Scope => "scope",
        Other => "other",
        Design => "design",
        Research => "research",
    }
}

string_enum! {
    pub enum DeliverableStatus {
        Draft => "draft",
        InReview => "in_review",
        Final => "final",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Version of a deliverable before any file has been uploaded.
pub const INITIAL_VERSION: i32 = 1;

/// Who approved a deliverable and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApprovalStamp {
    pub approved_at: Option<Timestamp>,
    pub approved_by: Option<UserId>,
}

/// The stamp a deliverable carries after moving to `status`.
///
/// Present iff the status is APPROVED. Re-approving keeps the original stamp.
pub fn approval_stamp_for(
    status: DeliverableStatus,
    current: ApprovalStamp,
    actor: UserId,
    now: Timestamp,
) -> ApprovalStamp {
    match status {
        DeliverableStatus::Approved if current.approved_at.is_some() => current,
        DeliverableStatus::Approved => ApprovalStamp {
            approved_at: Some(now),
            approved_by: Some(actor),
        },
        _ => ApprovalStamp::default(),
    }
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Storage directory for a project's deliverable files.
pub fn storage_dir(project_id: ProjectId) -> String {
    format!("deliverables/{project_id}")
}

/// Random stored filename that keeps the original extension, if any.
pub fn stored_filename(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Lower-cased extension of `name`, if it has a non-empty alphanumeric one.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn approving_stamps_actor_and_time() {
        let actor = UserId::new();
        let now = Utc::now();
        let stamp =
            approval_stamp_for(DeliverableStatus::Approved, ApprovalStamp::default(), actor, now);
        assert_eq!(stamp.approved_at, Some(now));
        assert_eq!(stamp.approved_by, Some(actor));
    }

    #[test]
    fn leaving_approved_clears_stamp() {
        let stamp = ApprovalStamp {
            approved_at: Some(Utc::now()),
            approved_by: Some(UserId::new()),
        };
        let cleared =
            approval_stamp_for(DeliverableStatus::Rejected, stamp, UserId::new(), Utc::now());
        assert_eq!(cleared, ApprovalStamp::default());
    }

    #[test]
    fn reapproving_keeps_first_stamp() {
        let first = ApprovalStamp {
            approved_at: Some(Utc::now()),
            approved_by: Some(UserId::new()),
        };
        let again =
            approval_stamp_for(DeliverableStatus::Approved, first, UserId::new(), Utc::now());
        assert_eq!(again, first);
    }

    #[test]
    fn stored_filename_keeps_extension() {
        let name = stored_filename("Brand Guide.PDF");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 36 + 4);
    }

    #[test]
    fn stored_filename_without_extension() {
        assert_eq!(stored_filename("README").len(), 36);
        assert_eq!(stored_filename(".env").len(), 36);
        assert_eq!(extension("archive.tar/../x"), None);
    }

    #[test]
    fn storage_dir_is_scoped_by_project() {
        let project = ProjectId::new();
        assert_eq!(storage_dir(project), format!("deliverables/{project}"));
    }
}
