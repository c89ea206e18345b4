//! Deliverable file (uploaded version) model and DTOs.

use portal_core::types::{DeliverableFileId, EntityRef, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `deliverable_files` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliverableFile {
    pub id: Uuid,
    pub deliverable_id: Uuid,
    pub filename: String,
    pub original_filename: String,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub size_bytes: i64,
    pub mime_type: Option<String>,
    pub version: i32,
    pub is_latest: bool,
    pub download_count: i32,
    pub uploaded_by: Option<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DeliverableFile {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::DeliverableFile(DeliverableFileId(self.id))
    }
}

/// Insert DTO for an uploaded file. Version and latest flag are set by the
/// repository.
#[derive(Debug, Clone)]
pub struct CreateDeliverableFile {
    pub deliverable_id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub mime_type: Option<String>,
    pub uploaded_by: Option<Uuid>,
}
