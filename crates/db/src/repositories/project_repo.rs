//! Repository for the `projects` table.

use portal_core::milestone::MilestoneStatus;
use portal_core::project::{Currency, ProjectStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};

const COLUMNS: &str = "id, client_id, name, description, status, budget_cents, currency, \
    progress_percentage, start_date, due_date, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project. Status defaults to `planning`, currency to `usd`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (client_id, name, description, status, budget_cents, currency, start_date, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.client_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.unwrap_or(ProjectStatus::Planning).as_str())
            .bind(input.budget_cents)
            .bind(input.currency.unwrap_or(Currency::Usd).as_str())
            .bind(input.start_date)
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    /// Find a project by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// List the projects owned by a client, newest first.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: Uuid,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE client_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                client_id = COALESCE($2, client_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                budget_cents = COALESCE($5, budget_cents),
                currency = COALESCE($6, currency),
                start_date = COALESCE($7, start_date),
                due_date = COALESCE($8, due_date)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(input.client_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.budget_cents)
            .bind(input.currency.map(|c| c.as_str()))
            .bind(input.start_date)
            .bind(input.due_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: ProjectStatus,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET status = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn set_progress(
        pool: &PgPool,
        id: Uuid,
        progress_percentage: i32,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET progress_percentage = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(progress_percentage)
            .fetch_optional(pool)
            .await
    }

    /// `(total, completed)` live milestone counts for a project.
    pub async fn milestone_counts(pool: &PgPool, id: Uuid) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE status = $2) \
             FROM milestones WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(MilestoneStatus::Completed.as_str())
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a project by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The client of the project that owns a row of `table`.
    ///
    /// Returns `None` when the row is missing or the project has no client.
    pub async fn client_for_child(
        pool: &PgPool,
        table: OwnedTable,
        id: Uuid,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let query = match table {
            OwnedTable::Milestones => {
                "SELECT p.client_id FROM milestones c JOIN projects p ON p.id = c.project_id \
                 WHERE c.id = $1 AND c.deleted_at IS NULL AND p.deleted_at IS NULL"
            }
            OwnedTable::Deliverables => {
                "SELECT p.client_id FROM deliverables c JOIN projects p ON p.id = c.project_id \
                 WHERE c.id = $1 AND c.deleted_at IS NULL AND p.deleted_at IS NULL"
            }
            OwnedTable::Meetings => {
                "SELECT p.client_id FROM meetings c JOIN projects p ON p.id = c.project_id \
                 WHERE c.id = $1 AND c.deleted_at IS NULL AND p.deleted_at IS NULL"
            }
        };
        let row: Option<Option<Uuid>> = sqlx::query_scalar(query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.flatten())
    }
}

/// Child tables whose rows resolve to a project client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedTable {
    Milestones,
    Deliverables,
    Meetings,
}
