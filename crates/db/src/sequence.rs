//! Locked `max + 1` allocation of per-scope sequence numbers.
//!
//! [`next_in_scope`] must run inside the transaction that inserts the row
//! receiving the number. The advisory lock it takes is released on commit or
//! rollback, so concurrent allocations in one scope are serialised and an
//! aborted transaction consumes nothing.

use portal_core::ordering::{next_in_sequence, SequenceScope};
use sqlx::PgConnection;

/// Take the transaction-scoped lock for `scope`.
pub async fn lock_scope(conn: &mut PgConnection, scope: &SequenceScope) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(scope.lock_key())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Lock `scope` and return the next value in it.
pub async fn next_in_scope(
    conn: &mut PgConnection,
    scope: &SequenceScope,
) -> Result<i32, sqlx::Error> {
    lock_scope(conn, scope).await?;

    let current_max: Option<i32> = match scope {
        SequenceScope::MilestoneOrder(project) => {
            sqlx::query_scalar(
                "SELECT MAX(sort_order) FROM milestones \
                 WHERE project_id = $1 AND deleted_at IS NULL",
            )
            .bind(project.as_uuid())
            .fetch_one(&mut *conn)
            .await?
        }
        SequenceScope::DeliverableOrder { project, milestone } => {
            sqlx::query_scalar(
                "SELECT MAX(sort_order) FROM deliverables \
                 WHERE project_id = $1 AND milestone_id IS NOT DISTINCT FROM $2 \
                 AND deleted_at IS NULL",
            )
            .bind(project.as_uuid())
            .bind(milestone.map(|m| m.as_uuid()))
            .fetch_one(&mut *conn)
            .await?
        }
        // Soft-deleted files keep their version so numbers are never reused.
        SequenceScope::FileVersion(deliverable) => {
            sqlx::query_scalar("SELECT MAX(version) FROM deliverable_files WHERE deliverable_id = $1")
                .bind(deliverable.as_uuid())
                .fetch_one(&mut *conn)
                .await?
        }
    };

    let next = next_in_sequence(current_max);
    tracing::debug!(scope = %scope.lock_key(), next, "Allocated sequence number");
    Ok(next)
}
