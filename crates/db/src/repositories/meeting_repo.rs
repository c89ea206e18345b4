//! Repository for the `meetings` table.

use portal_core::meeting::{MeetingLocation, MeetingStatus};
use portal_core::types::Timestamp;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::meeting::{Meeting, UpdateMeeting};

const COLUMNS: &str = "id, project_id, deliverable_id, title, description, scheduled_at, \
    duration_minutes, location, meeting_link, status, notes, scheduled_by, created_at, updated_at";

/// Insert DTO with defaults already resolved.
#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub project_id: Uuid,
    pub deliverable_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Timestamp,
    pub duration_minutes: i32,
    pub location: MeetingLocation,
    pub meeting_link: Option<String>,
    pub scheduled_by: Option<Uuid>,
}

pub struct MeetingRepo;

impl MeetingRepo {
    pub async fn create(pool: &PgPool, input: &NewMeeting) -> Result<Meeting, sqlx::Error> {
        let query = format!(
            "INSERT INTO meetings
                (project_id, deliverable_id, title, description, scheduled_at,
                 duration_minutes, location, meeting_link, status, scheduled_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(input.project_id)
            .bind(input.deliverable_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.scheduled_at)
            .bind(input.duration_minutes)
            .bind(input.location.as_str())
            .bind(&input.meeting_link)
            .bind(MeetingStatus::Scheduled.as_str())
            .bind(input.scheduled_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Meeting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM meetings WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Meeting>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A project's meetings, soonest first. `upcoming_after` keeps only open
    /// meetings scheduled after the given instant.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        upcoming_after: Option<Timestamp>,
    ) -> Result<Vec<Meeting>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM meetings
             WHERE project_id = $1 AND deleted_at IS NULL
               AND ($2::timestamptz IS NULL
                    OR (scheduled_at > $2 AND status IN ('scheduled', 'rescheduled')))
             ORDER BY scheduled_at"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(project_id)
            .bind(upcoming_after)
            .fetch_all(pool)
            .await
    }

    /// Update descriptive fields. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: &UpdateMeeting,
    ) -> Result<Option<Meeting>, sqlx::Error> {
        let query = format!(
            "UPDATE meetings SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                meeting_link = COALESCE($5, meeting_link)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.location.map(|l| l.as_str()))
            .bind(&input.meeting_link)
            .fetch_optional(pool)
            .await
    }

    /// Move a meeting to a new time and mark it rescheduled.
    pub async fn reschedule(
        pool: &PgPool,
        id: Uuid,
        scheduled_at: Timestamp,
        duration_minutes: Option<i32>,
    ) -> Result<Option<Meeting>, sqlx::Error> {
        let query = format!(
            "UPDATE meetings SET
                scheduled_at = $2,
                duration_minutes = COALESCE($3, duration_minutes),
                status = $4
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(id)
            .bind(scheduled_at)
            .bind(duration_minutes)
            .bind(MeetingStatus::Rescheduled.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Set status, keeping existing notes unless new ones are given.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: MeetingStatus,
        notes: Option<&str>,
    ) -> Result<Option<Meeting>, sqlx::Error> {
        let query = format!(
            "UPDATE meetings SET status = $2, notes = COALESCE($3, notes)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_notes(
        pool: &PgPool,
        id: Uuid,
        notes: &str,
    ) -> Result<Option<Meeting>, sqlx::Error> {
        let query = format!(
            "UPDATE meetings SET notes = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meeting>(&query)
            .bind(id)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a meeting by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE meetings SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
