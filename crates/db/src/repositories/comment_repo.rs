//! Repository for the `comments` table.

use portal_core::types::{Commentable, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::comment::{Comment, CommentThread, CreateComment};

const COLUMNS: &str = "id, project_id, commentable_type, commentable_id, parent_id, author_id, \
    body, is_internal, mentioned_users, read_at, created_at, updated_at";

pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(pool: &PgPool, input: &CreateComment) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments
                (project_id, commentable_type, commentable_id, parent_id, author_id,
                 body, is_internal, mentioned_users)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(input.project_id)
            .bind(input.placement.commentable.kind().as_str())
            .bind(input.placement.commentable.id())
            .bind(input.parent_id)
            .bind(input.author_id)
            .bind(&input.body)
            .bind(input.placement.is_internal)
            .bind(&input.mentioned_users)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Top-level comments on a subject with their replies, oldest first.
    /// Internal comments are left out unless `include_internal` is set.
    pub async fn list_threads(
        pool: &PgPool,
        subject: Commentable,
        include_internal: bool,
    ) -> Result<Vec<CommentThread>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE commentable_type = $1 AND commentable_id = $2
               AND ($3 OR NOT is_internal)
               AND deleted_at IS NULL
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, Comment>(&query)
            .bind(subject.kind().as_str())
            .bind(subject.id())
            .bind(include_internal)
            .fetch_all(pool)
            .await?;

        let (top, replies): (Vec<Comment>, Vec<Comment>) =
            rows.into_iter().partition(|c| c.parent_id.is_none());

        Ok(top
            .into_iter()
            .map(|comment| {
                let replies = replies
                    .iter()
                    .filter(|r| r.parent_id == Some(comment.id))
                    .cloned()
                    .collect();
                CommentThread { comment, replies }
            })
            .collect())
    }

    /// Replace a comment's body.
    pub async fn update_body(
        pool: &PgPool,
        id: Uuid,
        body: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET body = $2
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(body)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a comment and its replies. Returns `true` if the comment
    /// itself was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = NOW() \
             WHERE (id = $1 OR parent_id = $1) AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp `read_at` once; later calls keep the first stamp.
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        at: Timestamp,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET read_at = COALESCE(read_at, $2)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(pool)
            .await
    }
}
