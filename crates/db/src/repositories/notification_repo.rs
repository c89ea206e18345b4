//! Repository for the `notifications` table.

use portal_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{CreateNotification, Notification};

const COLUMNS: &str =
    "id, user_id, kind, subject_type, subject_id, data, read_at, created_at";

pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, kind, subject_type, subject_id, data)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(input.kind.as_str())
            .bind(input.subject.kind().as_str())
            .bind(input.subject.id())
            .bind(&input.data)
            .fetch_one(pool)
            .await
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND deleted_at IS NULL
               AND (NOT $2 OR read_at IS NULL)
             ORDER BY created_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND read_at IS NULL AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Mark one of the user's notifications read. Returns `None` if the user
    /// has no such notification.
    pub async fn mark_read(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        at: Timestamp,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET read_at = COALESCE(read_at, $3)
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(user_id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    /// Mark every unread notification of the user read. Returns the count.
    pub async fn mark_all_read(
        pool: &PgPool,
        user_id: Uuid,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $2 \
             WHERE user_id = $1 AND read_at IS NULL AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn soft_delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET deleted_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete all of the user's notifications. Returns the count.
    pub async fn clear_all(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET deleted_at = NOW() \
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
