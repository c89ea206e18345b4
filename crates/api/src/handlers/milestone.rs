//! Handlers for milestones, nested under projects for listing and creation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::actions::MilestoneAction;
use portal_core::error::CoreError;
use portal_core::milestone::status_change_actions;
use portal_core::ordering::{positions, validate_permutation};
use portal_core::policy::{can_milestone, ensure, MilestoneAbility, ProjectScope};
use portal_db::models::milestone::{
    CreateMilestone, Milestone, ReorderMilestones, UpdateMilestone, UpdateMilestoneStatus,
};
use portal_db::repositories::MilestoneRepo;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_milestone, find_project};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Load a milestone with the ownership scope of its project.
async fn load(state: &AppState, id: Uuid) -> AppResult<(Milestone, ProjectScope)> {
    let milestone = find_milestone(&state.pool, id).await?;
    let project = find_project(&state.pool, milestone.project_id).await?;
    Ok((milestone, project.scope()))
}

/// GET /api/v1/projects/{project_id}/milestones
pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Milestone>>>> {
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_milestone(&actor, MilestoneAbility::ViewAny, None))?;
    ensure(can_milestone(&actor, MilestoneAbility::View, Some(&project.scope())))?;

    let milestones = MilestoneRepo::list_by_project(&state.pool, project_id).await?;
    Ok(ApiResponse::new("Milestones retrieved", milestones))
}

/// POST /api/v1/projects/{project_id}/milestones
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateMilestone>,
) -> AppResult<(StatusCode, Json<ApiResponse<Milestone>>)> {
    input.validate()?;
    let project = find_project(&state.pool, project_id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::Create, Some(&project.scope())))?;

    let milestone = MilestoneRepo::create(&state.pool, project_id, &input).await?;

    state
        .dispatch(
            event_for(&user, milestone.entity_ref(), MilestoneAction::Created).with_metadata(
                json!({ "name": milestone.name, "order": milestone.sort_order }),
            ),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Milestone created", milestone),
    ))
}

/// GET /api/v1/milestones/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Milestone>>> {
    let (milestone, scope) = load(&state, id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::View, Some(&scope)))?;
    Ok(ApiResponse::new("Milestone retrieved", milestone))
}

/// PUT /api/v1/milestones/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMilestone>,
) -> AppResult<Json<ApiResponse<Milestone>>> {
    input.validate()?;
    let (_, scope) = load(&state, id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::Update, Some(&scope)))?;

    let milestone = MilestoneRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| CoreError::not_found("Milestone", id))?;

    state
        .dispatch(
            event_for(&user, milestone.entity_ref(), MilestoneAction::Updated)
                .with_metadata(json!({ "name": milestone.name })),
        )
        .await;

    Ok(ApiResponse::new("Milestone updated", milestone))
}

/// DELETE /api/v1/milestones/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (milestone, scope) = load(&state, id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::Delete, Some(&scope)))?;

    if !MilestoneRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Milestone", id).into());
    }

    state
        .dispatch(
            event_for(&user, milestone.entity_ref(), MilestoneAction::Deleted)
                .with_metadata(json!({ "name": milestone.name })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/milestones/{id}/status
///
/// A status that does not change anything announces nothing.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMilestoneStatus>,
) -> AppResult<Json<ApiResponse<Milestone>>> {
    let (_, scope) = load(&state, id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::ChangeStatus, Some(&scope)))?;

    let change = MilestoneRepo::set_status(&state.pool, id, input.status, Utc::now())
        .await?
        .ok_or_else(|| CoreError::not_found("Milestone", id))?;
    let (from, milestone) = (change.from, change.milestone);

    let actions = status_change_actions(from, milestone.status);
    if actions.is_empty() {
        return Ok(ApiResponse::new("Milestone status unchanged", milestone));
    }

    let events = actions
        .into_iter()
        .map(|action| {
            event_for(&user, milestone.entity_ref(), action)
                .with_metadata(json!({ "from": from, "to": milestone.status }))
        })
        .collect();
    state.dispatch_all(events).await;

    Ok(ApiResponse::new("Milestone status updated", milestone))
}

/// POST /api/v1/projects/{project_id}/milestones/reorder
///
/// The ids must be exactly the project's live milestones. One `reordered`
/// event is announced, about the first milestone, carrying the full order.
pub async fn reorder(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<ReorderMilestones>,
) -> AppResult<Json<ApiResponse<Vec<Milestone>>>> {
    input.validate()?;
    let project = find_project(&state.pool, project_id).await?;
    ensure(can_milestone(&user.actor(), MilestoneAbility::Reorder, Some(&project.scope())))?;

    let existing: Vec<Uuid> = MilestoneRepo::list_by_project(&state.pool, project_id)
        .await?
        .iter()
        .map(|m| m.id)
        .collect();
    validate_permutation(&existing, &input.milestone_ids)?;

    let milestones =
        MilestoneRepo::reorder(&state.pool, project_id, &positions(&input.milestone_ids)).await?;

    if let Some(first) = milestones.iter().find(|m| Some(&m.id) == input.milestone_ids.first()) {
        state
            .dispatch(
                event_for(&user, first.entity_ref(), MilestoneAction::Reordered)
                    .with_metadata(json!({ "milestone_ids": input.milestone_ids })),
            )
            .await;
    }

    Ok(ApiResponse::new("Milestones reordered", milestones))
}
