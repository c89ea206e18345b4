//! Handlers for the activity log (admin only).

use axum::extract::{Path, Query, State};
use axum::Json;
use portal_core::policy::{can_view_activity, ensure};
use portal_db::models::activity_log::{ActivityLog, ActivityLogQuery};
use portal_db::repositories::{page, ActivityLogRepo};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/activity?subject_type=&subject_id=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActivityLogQuery>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLog>>>> {
    ensure(can_view_activity(&user.actor()))?;
    let (limit, offset) = page(query.limit, query.offset);
    let logs = ActivityLogRepo::list(
        &state.pool,
        query.subject_type,
        query.subject_id,
        limit,
        offset,
    )
    .await?;
    Ok(ApiResponse::new("Activity retrieved", logs))
}

/// GET /api/v1/activity/users/{id}
pub async fn list_for_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLog>>>> {
    ensure(can_view_activity(&user.actor()))?;
    let (limit, offset) = params.page();
    let logs = ActivityLogRepo::list_for_user(&state.pool, id, limit, offset).await?;
    Ok(ApiResponse::new("Activity retrieved", logs))
}
