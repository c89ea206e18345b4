//! Repository layer: one zero-sized struct per table.

pub mod activity_log_repo;
pub mod comment_repo;
pub mod credential_repo;
pub mod deliverable_file_repo;
pub mod deliverable_repo;
pub mod meeting_repo;
pub mod milestone_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod user_repo;

pub use activity_log_repo::ActivityLogRepo;
pub use comment_repo::CommentRepo;
pub use credential_repo::CredentialRepo;
pub use deliverable_file_repo::DeliverableFileRepo;
pub use deliverable_repo::DeliverableRepo;
pub use meeting_repo::MeetingRepo;
pub use milestone_repo::MilestoneRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 200;

/// Clamp caller-supplied pagination to sane bounds.
pub fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        offset.unwrap_or(0).max(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(page(None, None), (DEFAULT_LIMIT, 0));
        assert_eq!(page(Some(0), Some(-5)), (1, 0));
        assert_eq!(page(Some(10_000), Some(20)), (MAX_LIMIT, 20));
    }
}
