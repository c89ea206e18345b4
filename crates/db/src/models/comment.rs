//! Comment entity model and DTOs.

use portal_core::comment::Placement;
use portal_core::policy::{CommentFacts, ProjectScope};
use portal_core::types::{CommentId, Commentable, EntityKind, EntityRef, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A comment row from the `comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    #[sqlx(try_from = "String")]
    pub commentable_type: EntityKind,
    pub commentable_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub body: String,
    pub is_internal: bool,
    pub mentioned_users: Vec<Uuid>,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Comment {
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Comment(CommentId(self.id))
    }

    pub fn commentable(&self) -> Option<Commentable> {
        Commentable::from_parts(self.commentable_type, self.commentable_id)
    }

    pub fn facts(&self, scope: ProjectScope) -> CommentFacts {
        CommentFacts {
            scope,
            author_id: UserId(self.author_id),
            is_internal: self.is_internal,
        }
    }
}

/// A top-level comment with its replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Request body for a new top-level comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub commentable_type: EntityKind,
    pub commentable_id: Uuid,
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
    #[serde(default)]
    pub mentioned_users: Vec<Uuid>,
}

/// Request body for a reply; subject and visibility come from the parent.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplyCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
    #[serde(default)]
    pub mentioned_users: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateComment {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

/// Query parameters selecting the subject whose comments are listed.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentSubjectQuery {
    pub commentable_type: EntityKind,
    pub commentable_id: Uuid,
}

/// Insert DTO for a comment.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub project_id: Uuid,
    pub placement: Placement,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub body: String,
    pub mentioned_users: Vec<Uuid>,
}
