//! Repository for the `credentials` table. Secrets arrive already encrypted.

use portal_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::credential::{CreateCredential, Credential, UpdateCredential};

const COLUMNS: &str = "id, project_id, name, kind, username, url, encrypted_secret, notes, \
    metadata, last_accessed_at, created_by, created_at, updated_at";

pub struct CredentialRepo;

impl CredentialRepo {
    pub async fn create(pool: &PgPool, input: &CreateCredential) -> Result<Credential, sqlx::Error> {
        let query = format!(
            "INSERT INTO credentials
                (project_id, name, kind, username, url, encrypted_secret, notes, metadata, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Credential>(&query)
            .bind(input.project_id)
            .bind(&input.name)
            .bind(input.kind.as_str())
            .bind(&input.username)
            .bind(&input.url)
            .bind(&input.encrypted_secret)
            .bind(&input.notes)
            .bind(&input.metadata)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Credential>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM credentials WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Credential>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Credential>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM credentials
             WHERE project_id = $1 AND deleted_at IS NULL
             ORDER BY name"
        );
        sqlx::query_as::<_, Credential>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update a credential. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &UpdateCredential,
    ) -> Result<Option<Credential>, sqlx::Error> {
        let query = format!(
            "UPDATE credentials SET
                name = COALESCE($2, name),
                kind = COALESCE($3, kind),
                username = COALESCE($4, username),
                url = COALESCE($5, url),
                encrypted_secret = COALESCE($6, encrypted_secret),
                notes = COALESCE($7, notes),
                metadata = COALESCE($8, metadata)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Credential>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.kind.map(|k| k.as_str()))
            .bind(&input.username)
            .bind(&input.url)
            .bind(&input.encrypted_secret)
            .bind(&input.notes)
            .bind(&input.metadata)
            .fetch_optional(pool)
            .await
    }

    /// Record a reveal.
    pub async fn touch_last_accessed(
        pool: &PgPool,
        id: Uuid,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE credentials SET last_accessed_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a credential by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE credentials SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
