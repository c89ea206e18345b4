//! Repository for the `deliverable_files` table.
//!
//! At most one live file per deliverable is flagged `is_latest`, and the
//! deliverable's `version` mirrors the latest file's version.

use portal_core::ordering::SequenceScope;
use portal_core::types::DeliverableId;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::deliverable_file::{CreateDeliverableFile, DeliverableFile};
use crate::sequence;

const COLUMNS: &str = "id, deliverable_id, filename, original_filename, storage_path, \
    size_bytes, mime_type, version, is_latest, download_count, uploaded_by, created_at, updated_at";

pub struct DeliverableFileRepo;

impl DeliverableFileRepo {
    /// Insert an uploaded file as the deliverable's new latest version.
    ///
    /// Allocates the next version, clears the previous latest flag and bumps
    /// `deliverables.version`, all in one transaction.
    pub async fn create_latest(
        pool: &PgPool,
        input: &CreateDeliverableFile,
    ) -> Result<DeliverableFile, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let scope = SequenceScope::FileVersion(DeliverableId(input.deliverable_id));
        let version = sequence::next_in_scope(&mut tx, &scope).await?;

        sqlx::query(
            "UPDATE deliverable_files SET is_latest = false \
             WHERE deliverable_id = $1 AND is_latest",
        )
        .bind(input.deliverable_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO deliverable_files
                (deliverable_id, filename, original_filename, storage_path, size_bytes,
                 mime_type, version, is_latest, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, true, $8)
             RETURNING {COLUMNS}"
        );
        let file = sqlx::query_as::<_, DeliverableFile>(&query)
            .bind(input.deliverable_id)
            .bind(&input.filename)
            .bind(&input.original_filename)
            .bind(&input.storage_path)
            .bind(input.size_bytes)
            .bind(&input.mime_type)
            .bind(version)
            .bind(input.uploaded_by)
            .fetch_one(&mut *tx)
            .await?;

        set_deliverable_version(&mut tx, input.deliverable_id, version).await?;

        tx.commit().await?;
        Ok(file)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<DeliverableFile>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM deliverable_files WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, DeliverableFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every live version of a deliverable, newest first.
    pub async fn list_by_deliverable(
        pool: &PgPool,
        deliverable_id: Uuid,
    ) -> Result<Vec<DeliverableFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverable_files
             WHERE deliverable_id = $1 AND deleted_at IS NULL
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, DeliverableFile>(&query)
            .bind(deliverable_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_latest(
        pool: &PgPool,
        deliverable_id: Uuid,
    ) -> Result<Option<DeliverableFile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverable_files
             WHERE deliverable_id = $1 AND is_latest AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, DeliverableFile>(&query)
            .bind(deliverable_id)
            .fetch_optional(pool)
            .await
    }

    /// Count a download and return the new total.
    pub async fn increment_download_count(pool: &PgPool, id: Uuid) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE deliverable_files SET download_count = download_count + 1 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING download_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a file. If it was the latest, the highest remaining
    /// version is promoted and the deliverable's version follows it.
    ///
    /// Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deliverable_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT deliverable_id FROM deliverable_files WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(deliverable_id) = deliverable_id else {
            return Ok(false);
        };

        // Same lock as version allocation, so an upload cannot interleave.
        sequence::lock_scope(&mut tx, &SequenceScope::FileVersion(DeliverableId(deliverable_id)))
            .await?;

        let was_latest: Option<bool> = sqlx::query_scalar(
            "SELECT is_latest FROM deliverable_files WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(was_latest) = was_latest else {
            return Ok(false);
        };

        sqlx::query("UPDATE deliverable_files SET deleted_at = NOW(), is_latest = false WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if was_latest {
            let promoted: Option<i32> = sqlx::query_scalar(
                "UPDATE deliverable_files SET is_latest = true
                 WHERE id = (
                     SELECT id FROM deliverable_files
                     WHERE deliverable_id = $1 AND deleted_at IS NULL
                     ORDER BY version DESC LIMIT 1
                 )
                 RETURNING version",
            )
            .bind(deliverable_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(version) = promoted {
                set_deliverable_version(&mut tx, deliverable_id, version).await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}

async fn set_deliverable_version(
    conn: &mut PgConnection,
    deliverable_id: Uuid,
    version: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE deliverables SET version = $2 WHERE id = $1")
        .bind(deliverable_id)
        .bind(version)
        .execute(conn)
        .await?;
    Ok(())
}
