//! Handlers for the current user's notifications.
//!
//! Every query is scoped to the caller, so someone else's notification is
//! indistinguishable from a missing one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::error::CoreError;
use portal_db::models::notification::{Notification, NotificationListParams, UnreadCount};
use portal_db::repositories::{page, NotificationRepo};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AffectedCount {
    pub count: u64,
}

/// GET /api/v1/notifications?unread_only=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<NotificationListParams>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let (limit, offset) = page(params.limit, params.offset);
    let notifications =
        NotificationRepo::list_for_user(&state.pool, user.user_id, params.unread_only, limit, offset)
            .await?;
    Ok(ApiResponse::new("Notifications retrieved", notifications))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let unread_count = NotificationRepo::unread_count(&state.pool, user.user_id).await?;
    Ok(ApiResponse::new("Unread count retrieved", UnreadCount { unread_count }))
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = NotificationRepo::mark_read(&state.pool, user.user_id, id, Utc::now())
        .await?
        .ok_or_else(|| CoreError::not_found("Notification", id))?;
    Ok(ApiResponse::new("Notification marked as read", notification))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AffectedCount>>> {
    let count = NotificationRepo::mark_all_read(&state.pool, user.user_id, Utc::now()).await?;
    Ok(ApiResponse::new(
        "All notifications marked as read",
        AffectedCount { count },
    ))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !NotificationRepo::soft_delete(&state.pool, user.user_id, id).await? {
        return Err(CoreError::not_found("Notification", id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/notifications
pub async fn clear_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<StatusCode> {
    let cleared = NotificationRepo::clear_all(&state.pool, user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, cleared, "Cleared notifications");
    Ok(StatusCode::NO_CONTENT)
}
