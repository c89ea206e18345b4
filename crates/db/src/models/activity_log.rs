//! Activity log model. Rows are append-only.

use portal_core::activity::LogName;
use portal_core::types::{EntityKind, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `activity_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityLog {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub log_name: LogName,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub subject_type: EntityKind,
    pub subject_id: Uuid,
    pub causer_type: Option<String>,
    pub causer_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub properties: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// Query parameters for activity listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogQuery {
    pub subject_type: Option<EntityKind>,
    pub subject_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
