//! Repository for the `deliverables` table.

use portal_core::deliverable::{ApprovalStamp, DeliverableStatus, INITIAL_VERSION};
use portal_core::ordering::SequenceScope;
use portal_core::types::{MilestoneId, ProjectId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};
use crate::sequence;

pub(crate) const COLUMNS: &str = "id, project_id, milestone_id, name, description, content, \
    kind, status, version, sort_order, approved_at, approved_by, created_at, updated_at";

/// Provides CRUD and status operations for deliverables.
pub struct DeliverableRepo;

impl DeliverableRepo {
    /// Insert a draft deliverable at the end of its (project, milestone) scope.
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        input: &CreateDeliverable,
    ) -> Result<Deliverable, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let scope = SequenceScope::DeliverableOrder {
            project: ProjectId(project_id),
            milestone: input.milestone_id.map(MilestoneId),
        };
        let sort_order = sequence::next_in_scope(&mut tx, &scope).await?;

        let query = format!(
            "INSERT INTO deliverables
                (project_id, milestone_id, name, description, content, kind, status, version, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let deliverable = sqlx::query_as::<_, Deliverable>(&query)
            .bind(project_id)
            .bind(input.milestone_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.kind.as_str())
            .bind(DeliverableStatus::Draft.as_str())
            .bind(INITIAL_VERSION)
            .bind(sort_order)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deliverable)
    }

    /// Find a deliverable by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Deliverable>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM deliverables WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's deliverables, optionally only those of one milestone.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        milestone_id: Option<Uuid>,
    ) -> Result<Vec<Deliverable>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverables
             WHERE project_id = $1 AND ($2::uuid IS NULL OR milestone_id = $2)
               AND deleted_at IS NULL
             ORDER BY milestone_id NULLS FIRST, sort_order"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(project_id)
            .bind(milestone_id)
            .fetch_all(pool)
            .await
    }

    /// Update a deliverable. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &UpdateDeliverable,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!(
            "UPDATE deliverables SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                kind = COALESCE($5, kind)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.kind.map(|k| k.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Set status together with its approval stamp.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: DeliverableStatus,
        stamp: ApprovalStamp,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!(
            "UPDATE deliverables SET status = $2, approved_at = $3, approved_by = $4
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(stamp.approved_at)
            .bind(stamp.approved_by.map(|u| u.as_uuid()))
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a deliverable by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE deliverables SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
