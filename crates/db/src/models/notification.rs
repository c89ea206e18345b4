//! Notification entity model and DTOs.

use portal_core::notification::NotificationType;
use portal_core::types::{EntityKind, EntityRef, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A notification row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub kind: NotificationType,
    #[sqlx(try_from = "String")]
    pub subject_type: EntityKind,
    pub subject_id: Uuid,
    pub data: serde_json::Value,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Insert DTO for a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub subject: EntityRef,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}
