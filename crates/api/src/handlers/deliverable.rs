//! Handlers for deliverables and their approval workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::actions::DeliverableAction;
use portal_core::deliverable::{approval_stamp_for, ApprovalStamp, DeliverableStatus};
use portal_core::error::CoreError;
use portal_core::policy::{can_deliverable, ensure, DeliverableAbility, ProjectScope};
use portal_core::types::UserId;
use portal_db::models::deliverable::{
    ChangeDeliverableStatus, CreateDeliverable, Deliverable, DeliverableFilter,
    RejectDeliverable, UpdateDeliverable,
};
use portal_db::repositories::{DeliverableRepo, MilestoneRepo};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_deliverable, find_project};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Load a deliverable with the ownership scope of its project.
pub(crate) async fn load(state: &AppState, id: Uuid) -> AppResult<(Deliverable, ProjectScope)> {
    let deliverable = find_deliverable(&state.pool, id).await?;
    let project = find_project(&state.pool, deliverable.project_id).await?;
    Ok((deliverable, project.scope()))
}

/// Move a deliverable to `status`, keeping the approval stamp consistent.
async fn transition(
    state: &AppState,
    user: &AuthUser,
    deliverable: &Deliverable,
    status: DeliverableStatus,
) -> AppResult<Deliverable> {
    let stamp: ApprovalStamp = approval_stamp_for(
        status,
        deliverable.approval_stamp(),
        UserId(user.user_id),
        Utc::now(),
    );
    DeliverableRepo::set_status(&state.pool, deliverable.id, status, stamp)
        .await?
        .ok_or_else(|| CoreError::not_found("Deliverable", deliverable.id).into())
}

/// GET /api/v1/projects/{project_id}/deliverables?milestone_id=
pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(filter): Query<DeliverableFilter>,
) -> AppResult<Json<ApiResponse<Vec<Deliverable>>>> {
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_deliverable(&actor, DeliverableAbility::ViewAny, None))?;
    ensure(can_deliverable(&actor, DeliverableAbility::View, Some(&project.scope())))?;

    let deliverables =
        DeliverableRepo::list_by_project(&state.pool, project_id, filter.milestone_id).await?;
    Ok(ApiResponse::new("Deliverables retrieved", deliverables))
}

/// POST /api/v1/projects/{project_id}/deliverables
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateDeliverable>,
) -> AppResult<(StatusCode, Json<ApiResponse<Deliverable>>)> {
    input.validate()?;
    let project = find_project(&state.pool, project_id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::Create, Some(&project.scope())))?;

    if let Some(milestone_id) = input.milestone_id {
        let milestone = MilestoneRepo::find_by_id(&state.pool, milestone_id).await?;
        if !milestone.is_some_and(|m| m.project_id == project_id) {
            return Err(CoreError::Validation(
                "milestone_id must reference a milestone of this project".into(),
            )
            .into());
        }
    }

    let deliverable = DeliverableRepo::create(&state.pool, project_id, &input).await?;

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::Created).with_metadata(
                json!({
                    "name": deliverable.name,
                    "type": deliverable.kind,
                    "order": deliverable.sort_order,
                }),
            ),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Deliverable created", deliverable),
    ))
}

/// GET /api/v1/deliverables/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deliverable>>> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::View, Some(&scope)))?;
    Ok(ApiResponse::new("Deliverable retrieved", deliverable))
}

/// PUT /api/v1/deliverables/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateDeliverable>,
) -> AppResult<Json<ApiResponse<Deliverable>>> {
    input.validate()?;
    let (_, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::Update, Some(&scope)))?;

    let deliverable = DeliverableRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("Deliverable", id))?;

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::Updated)
                .with_metadata(json!({ "name": deliverable.name })),
        )
        .await;

    Ok(ApiResponse::new("Deliverable updated", deliverable))
}

/// DELETE /api/v1/deliverables/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::Delete, Some(&scope)))?;

    if !DeliverableRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Deliverable", id).into());
    }

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::Deleted)
                .with_metadata(json!({ "name": deliverable.name })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/deliverables/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ChangeDeliverableStatus>,
) -> AppResult<Json<ApiResponse<Deliverable>>> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::ChangeStatus, Some(&scope)))?;

    let from = deliverable.status;
    let updated = transition(&state, &user, &deliverable, input.status).await?;

    state
        .dispatch(
            event_for(&user, updated.entity_ref(), DeliverableAction::StatusChanged)
                .with_metadata(json!({ "from": from, "to": updated.status })),
        )
        .await;

    Ok(ApiResponse::new("Deliverable status updated", updated))
}

/// POST /api/v1/deliverables/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deliverable>>> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::Approve, Some(&scope)))?;

    let from = deliverable.status;
    let updated = transition(&state, &user, &deliverable, DeliverableStatus::Approved).await?;

    state
        .dispatch(
            event_for(&user, updated.entity_ref(), DeliverableAction::Approved)
                .with_metadata(json!({ "from": from, "name": updated.name })),
        )
        .await;

    Ok(ApiResponse::new("Deliverable approved", updated))
}

/// POST /api/v1/deliverables/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectDeliverable>>,
) -> AppResult<Json<ApiResponse<Deliverable>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    input.validate()?;
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::Reject, Some(&scope)))?;

    let from = deliverable.status;
    let updated = transition(&state, &user, &deliverable, DeliverableStatus::Rejected).await?;

    state
        .dispatch(
            event_for(&user, updated.entity_ref(), DeliverableAction::Rejected).with_metadata(
                json!({ "from": from, "name": updated.name, "feedback": input.feedback }),
            ),
        )
        .await;

    Ok(ApiResponse::new("Deliverable rejected", updated))
}
