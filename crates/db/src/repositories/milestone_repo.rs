//! Repository for the `milestones` table.

use portal_core::milestone::{completed_at_for, MilestoneStatus};
use portal_core::ordering::SequenceScope;
use portal_core::types::{ProjectId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::milestone::{CreateMilestone, Milestone, UpdateMilestone};
use crate::sequence;

const COLUMNS: &str = "id, project_id, name, description, sort_order, status, start_date, \
    due_date, completed_at, progress_percentage, created_at, updated_at";

/// Result of [`MilestoneRepo::set_status`].
#[derive(Debug, Clone)]
pub struct MilestoneStatusChange {
    /// Status before the transition, read under the row lock.
    pub from: MilestoneStatus,
    pub milestone: Milestone,
}

/// Provides CRUD, status and ordering operations for milestones.
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// Insert a milestone at the end of its project's order.
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        input: &CreateMilestone,
    ) -> Result<Milestone, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let scope = SequenceScope::MilestoneOrder(ProjectId(project_id));
        let sort_order = sequence::next_in_scope(&mut tx, &scope).await?;

        let query = format!(
            "INSERT INTO milestones (project_id, name, description, sort_order, start_date, due_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(sort_order)
            .bind(input.start_date)
            .bind(input.due_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(milestone)
    }

    /// Find a milestone by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Milestone>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM milestones WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's milestones in display order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Milestone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE project_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update a milestone. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &UpdateMilestone,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "UPDATE milestones SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                due_date = COALESCE($5, due_date),
                progress_percentage = COALESCE($6, progress_percentage)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.start_date)
            .bind(input.due_date)
            .bind(input.progress_percentage)
            .fetch_optional(pool)
            .await
    }

    /// Move a milestone to `status`, returning the status it had before.
    ///
    /// The row is locked while the previous status is read, so concurrent
    /// transitions are serialized and only one of them observes any given
    /// `from`. `completed_at` follows [`completed_at_for`]. A transition to
    /// the current status writes nothing.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: MilestoneStatus,
        now: Timestamp,
    ) -> Result<Option<MilestoneStatusChange>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE id = $1 AND deleted_at IS NULL
             FOR UPDATE"
        );
        let Some(current) = sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let from = current.status;
        if from == status {
            tx.commit().await?;
            return Ok(Some(MilestoneStatusChange {
                from,
                milestone: current,
            }));
        }

        let query = format!(
            "UPDATE milestones SET status = $2, completed_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(completed_at_for(status, current.completed_at, now))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(MilestoneStatusChange { from, milestone }))
    }

    /// Assign `sort_order = position` for each `(id, position)` pair.
    ///
    /// Runs under the project's ordering lock. Rows are first moved to
    /// negative positions so the unique order index never sees a transient
    /// duplicate.
    pub async fn reorder(
        pool: &PgPool,
        project_id: Uuid,
        positions: &[(Uuid, i32)],
    ) -> Result<Vec<Milestone>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sequence::lock_scope(&mut tx, &SequenceScope::MilestoneOrder(ProjectId(project_id)))
            .await?;

        for sign in [-1, 1] {
            for (id, position) in positions {
                sqlx::query(
                    "UPDATE milestones SET sort_order = $3 \
                     WHERE id = $1 AND project_id = $2 AND deleted_at IS NULL",
                )
                .bind(id)
                .bind(project_id)
                .bind(sign * position)
                .execute(&mut *tx)
                .await?;
            }
        }

        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE project_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order"
        );
        let milestones = sqlx::query_as::<_, Milestone>(&query)
            .bind(project_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(milestones)
    }

    /// Soft-delete a milestone by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE milestones SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
