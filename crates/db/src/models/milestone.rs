//! Milestone entity model and DTOs.

use chrono::NaiveDate;
use portal_core::milestone::MilestoneStatus;
use portal_core::types::{EntityRef, MilestoneId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A milestone row from the `milestones` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    #[sqlx(try_from = "String")]
    pub status: MilestoneStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<Timestamp>,
    pub progress_percentage: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Milestone {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Milestone(MilestoneId(self.id))
    }
}

/// DTO for creating a milestone. The order is allocated by the repository.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMilestone {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// DTO for updating a milestone. Status has its own endpoint.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMilestone {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 100))]
    pub progress_percentage: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMilestoneStatus {
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReorderMilestones {
    #[validate(length(min = 1))]
    pub milestone_ids: Vec<Uuid>,
}
