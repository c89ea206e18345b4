//! Deliverable entity model and DTOs.

use portal_core::deliverable::{ApprovalStamp, DeliverableStatus, DeliverableType};
use portal_core::types::{DeliverableId, EntityRef, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A deliverable row from the `deliverables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deliverable {
    pub id: Uuid,
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: DeliverableType,
    #[sqlx(try_from = "String")]
    pub status: DeliverableStatus,
    pub version: i32,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub approved_at: Option<Timestamp>,
    pub approved_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Deliverable {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Deliverable(DeliverableId(self.id))
    }

    pub fn approval_stamp(&self) -> ApprovalStamp {
        ApprovalStamp {
            approved_at: self.approved_at,
            approved_by: self.approved_by.map(UserId),
        }
    }
}

/// DTO for creating a deliverable. Order and version are assigned on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDeliverable {
    pub milestone_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: DeliverableType,
}

/// DTO for updating a deliverable. All fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDeliverable {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<DeliverableType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDeliverableStatus {
    pub status: DeliverableStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RejectDeliverable {
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

/// Query parameters for listing a project's deliverables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliverableFilter {
    pub milestone_id: Option<Uuid>,
}
