//! Handlers for threaded comments on projects, milestones and deliverables.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::actions::CommentAction;
use portal_core::comment::{normalize_mentions, reply_target, Placement};
use portal_core::error::CoreError;
use portal_core::policy::{
    can_comment, can_project, ensure, CommentAbility, ProjectAbility, ProjectScope,
};
use portal_core::types::{CommentId, Commentable, EntityKind, UserId};
use portal_db::models::comment::{
    Comment, CommentSubjectQuery, CommentThread, CreateComment, CreateCommentRequest,
    ReplyCommentRequest, UpdateComment,
};
use portal_db::repositories::CommentRepo;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_deliverable, find_milestone, find_project};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// The project a commentable subject belongs to.
async fn subject_project_id(state: &AppState, subject: Commentable) -> AppResult<Uuid> {
    Ok(match subject {
        Commentable::Project(id) => find_project(&state.pool, id.0).await?.id,
        Commentable::Milestone(id) => find_milestone(&state.pool, id.0).await?.project_id,
        Commentable::Deliverable(id) => find_deliverable(&state.pool, id.0).await?.project_id,
    })
}

fn commentable(kind: EntityKind, id: Uuid) -> AppResult<Commentable> {
    Commentable::from_parts(kind, id).ok_or_else(|| {
        CoreError::Validation(format!("Comments cannot be attached to a {kind}")).into()
    })
}

async fn load(state: &AppState, id: Uuid) -> AppResult<(Comment, ProjectScope)> {
    let comment = CommentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id))?;
    let project = find_project(&state.pool, comment.project_id).await?;
    Ok((comment, project.scope()))
}

fn mention_ids(mentioned: &[Uuid]) -> Vec<Uuid> {
    let ids: Vec<UserId> = mentioned.iter().copied().map(UserId).collect();
    normalize_mentions(&ids).into_iter().map(|id| id.0).collect()
}

/// Announce a new comment, then its mentions if there are any.
async fn announce_created(state: &AppState, user: &AuthUser, comment: &Comment) {
    let mut events = vec![event_for(user, comment.entity_ref(), CommentAction::Created)
        .with_metadata(json!({
            "commentable_type": comment.commentable_type,
            "commentable_id": comment.commentable_id,
            "parent_id": comment.parent_id,
            "is_internal": comment.is_internal,
        }))];

    if !comment.mentioned_users.is_empty() {
        events.push(
            event_for(user, comment.entity_ref(), CommentAction::MentionedUsers)
                .with_metadata(json!({ "mentioned_users": comment.mentioned_users })),
        );
    }

    state.dispatch_all(events).await;
}

/// GET /api/v1/projects/{project_id}/comments?commentable_type=&commentable_id=
///
/// Top-level comments with their replies. Internal comments are left out
/// for anyone who may not see them.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(query): Query<CommentSubjectQuery>,
) -> AppResult<Json<ApiResponse<Vec<CommentThread>>>> {
    let subject = commentable(query.commentable_type, query.commentable_id)?;
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_comment(&actor, CommentAbility::ViewAny))?;
    ensure(can_project(&actor, ProjectAbility::View, Some(&project.scope())))?;

    if subject_project_id(&state, subject).await? != project_id {
        return Err(CoreError::not_found(subject.kind().as_str(), subject.id()).into());
    }

    let include_internal = can_comment(&actor, CommentAbility::ViewInternal);
    let threads = CommentRepo::list_threads(&state.pool, subject, include_internal).await?;
    Ok(ApiResponse::new("Comments retrieved", threads))
}

/// POST /api/v1/projects/{project_id}/comments
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    input.validate()?;
    let subject = commentable(input.commentable_type, input.commentable_id)?;
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_comment(&actor, CommentAbility::Create(&project.scope())))?;
    if input.is_internal {
        ensure(can_comment(&actor, CommentAbility::CreateInternal))?;
    }

    if subject_project_id(&state, subject).await? != project_id {
        return Err(CoreError::Validation(
            "The commented resource does not belong to this project".into(),
        )
        .into());
    }

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            project_id,
            placement: Placement {
                commentable: subject,
                is_internal: input.is_internal,
            },
            parent_id: None,
            author_id: user.user_id,
            body: input.body,
            mentioned_users: mention_ids(&input.mentioned_users),
        },
    )
    .await?;

    announce_created(&state, &user, &comment).await;

    Ok((StatusCode::CREATED, ApiResponse::new("Comment created", comment)))
}

/// POST /api/v1/comments/{id}/replies
///
/// Replies to a reply attach to the top-level comment, so threads stay one
/// level deep.
pub async fn reply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ReplyCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    input.validate()?;
    let (parent, scope) = load(&state, id).await?;
    ensure(can_comment(&user.actor(), CommentAbility::Reply(&parent.facts(scope))))?;

    let commentable = parent
        .commentable()
        .ok_or_else(|| CoreError::Internal(format!("Comment {id} has an invalid subject")))?;
    let target = reply_target(
        CommentId(parent.id),
        parent.parent_id.map(CommentId),
        Placement {
            commentable,
            is_internal: parent.is_internal,
        },
    );

    let comment = CommentRepo::create(
        &state.pool,
        &CreateComment {
            project_id: parent.project_id,
            placement: target.placement,
            parent_id: Some(target.root.0),
            author_id: user.user_id,
            body: input.body,
            mentioned_users: mention_ids(&input.mentioned_users),
        },
    )
    .await?;

    announce_created(&state, &user, &comment).await;

    Ok((StatusCode::CREATED, ApiResponse::new("Reply created", comment)))
}

/// GET /api/v1/comments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    let (comment, scope) = load(&state, id).await?;
    ensure(can_comment(&user.actor(), CommentAbility::View(&comment.facts(scope))))?;
    Ok(ApiResponse::new("Comment retrieved", comment))
}

/// PUT /api/v1/comments/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateComment>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    input.validate()?;
    let (comment, scope) = load(&state, id).await?;
    ensure(can_comment(&user.actor(), CommentAbility::Update(&comment.facts(scope))))?;

    let comment = CommentRepo::update_body(&state.pool, id, &input.body)
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id))?;

    state
        .dispatch(event_for(&user, comment.entity_ref(), CommentAction::Updated))
        .await;

    Ok(ApiResponse::new("Comment updated", comment))
}

/// DELETE /api/v1/comments/{id}
///
/// Replies go with their parent.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (comment, scope) = load(&state, id).await?;
    ensure(can_comment(&user.actor(), CommentAbility::Delete(&comment.facts(scope))))?;

    if !CommentRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Comment", id).into());
    }

    state
        .dispatch(
            event_for(&user, comment.entity_ref(), CommentAction::Deleted).with_metadata(json!({
                "commentable_type": comment.commentable_type,
                "commentable_id": comment.commentable_id,
            })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/comments/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    let (comment, scope) = load(&state, id).await?;
    ensure(can_comment(&user.actor(), CommentAbility::MarkRead(&comment.facts(scope))))?;

    let comment = CommentRepo::mark_read(&state.pool, id, Utc::now())
        .await?
        .ok_or_else(|| CoreError::not_found("Comment", id))?;
    Ok(ApiResponse::new("Comment marked as read", comment))
}
