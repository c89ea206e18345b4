//! Repository for the append-only `activity_logs` table.

use portal_core::activity::ActivityEntry;
use portal_core::types::EntityKind;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::activity_log::ActivityLog;

const COLUMNS: &str = "id, log_name, description, subject_type, subject_id, causer_type, \
    causer_id, user_id, properties, ip_address, user_agent, created_at";

pub struct ActivityLogRepo;

impl ActivityLogRepo {
    pub async fn create(pool: &PgPool, entry: &ActivityEntry) -> Result<ActivityLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO activity_logs
                (log_name, description, subject_type, subject_id, causer_type, causer_id,
                 user_id, properties, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(entry.log_name.as_str())
            .bind(&entry.description)
            .bind(entry.subject.kind().as_str())
            .bind(entry.subject.id())
            .bind(entry.causer.map(|c| c.kind().as_str()))
            .bind(entry.causer.map(|c| c.id()))
            .bind(entry.user_id.map(|u| u.as_uuid()))
            .bind(&entry.properties)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Entries, newest first, optionally restricted to one subject.
    pub async fn list(
        pool: &PgPool,
        subject_type: Option<EntityKind>,
        subject_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activity_logs
             WHERE ($1::text IS NULL OR subject_type = $1)
               AND ($2::uuid IS NULL OR subject_id = $2)
             ORDER BY created_at DESC, id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(subject_type.map(|k| k.as_str()))
            .bind(subject_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Entries caused by one user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ActivityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM activity_logs
             WHERE user_id = $1
             ORDER BY created_at DESC, id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ActivityLog>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
