//! Project entity model and DTOs.

use chrono::NaiveDate;
use portal_core::policy::ProjectScope;
use portal_core::project::{Currency, ProjectStatus};
use portal_core::types::{EntityRef, ProjectId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub budget_cents: Option<i64>,
    #[sqlx(try_from = "String")]
    pub currency: Currency,
    pub progress_percentage: i32,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Project(ProjectId(self.id))
    }

    /// Ownership facts used by every policy check under this project.
    pub fn scope(&self) -> ProjectScope {
        ProjectScope::owned_by(self.client_id.map(UserId))
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `planning` if omitted.
    pub status: Option<ProjectStatus>,
    #[validate(range(min = 0))]
    pub budget_cents: Option<i64>,
    /// Defaults to `usd` if omitted.
    pub currency: Option<Currency>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProject {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub budget_cents: Option<i64>,
    pub currency: Option<Currency>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeProjectStatus {
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProgress {
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: i32,
}
