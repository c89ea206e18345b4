//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::actions::ProjectAction;
use portal_core::error::CoreError;
use portal_core::policy::{can_project, ensure, ProjectAbility};
use portal_core::project::{progress_from_milestones, validate_progress};
use portal_core::roles::Role;
use portal_db::models::project::{
    ChangeProjectStatus, CreateProject, Project, UpdateProgress, UpdateProject,
};
use portal_db::repositories::{ProjectRepo, UserRepo};
use portal_db::DbPool;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_project};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

/// A project's client must be an existing CLIENT user.
async fn ensure_client(pool: &DbPool, client_id: Uuid) -> AppResult<()> {
    match UserRepo::find_by_id(pool, client_id).await? {
        Some(user) if user.role == Role::Client => Ok(()),
        _ => Err(AppError::Core(CoreError::Validation(
            "client_id must reference an existing client".into(),
        ))),
    }
}

fn project_not_found(id: Uuid) -> AppError {
    CoreError::not_found("Project", id).into()
}

/// GET /api/v1/projects
///
/// Admins see every project, clients only their own.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Project>>>> {
    ensure(can_project(&user.actor(), ProjectAbility::ViewAny, None))?;
    let projects = if user.role.is_admin() {
        ProjectRepo::list(&state.pool).await?
    } else {
        ProjectRepo::list_for_client(&state.pool, user.user_id).await?
    };
    Ok(ApiResponse::new("Projects retrieved", projects))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(&user.actor(), ProjectAbility::View, Some(&project.scope())))?;
    Ok(ApiResponse::new("Project retrieved", project))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<ApiResponse<Project>>)> {
    ensure(can_project(&user.actor(), ProjectAbility::Create, None))?;
    input.validate()?;
    if let Some(client_id) = input.client_id {
        ensure_client(&state.pool, client_id).await?;
    }

    let project = ProjectRepo::create(&state.pool, &input).await?;

    state
        .dispatch(
            event_for(&user, project.entity_ref(), ProjectAction::Created)
                .with_metadata(json!({ "name": project.name, "client_id": project.client_id })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Project created", project),
    ))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<ApiResponse<Project>>> {
    input.validate()?;
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(&user.actor(), ProjectAbility::Update, Some(&project.scope())))?;
    if let Some(client_id) = input.client_id {
        ensure_client(&state.pool, client_id).await?;
    }

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    state
        .dispatch(
            event_for(&user, project.entity_ref(), ProjectAction::Updated)
                .with_metadata(json!({ "name": project.name })),
        )
        .await;

    Ok(ApiResponse::new("Project updated", project))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(&user.actor(), ProjectAbility::Delete, Some(&project.scope())))?;

    if !ProjectRepo::soft_delete(&state.pool, id).await? {
        return Err(project_not_found(id));
    }

    state
        .dispatch(
            event_for(&user, project.entity_ref(), ProjectAction::Deleted)
                .with_metadata(json!({ "name": project.name })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ChangeProjectStatus>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(
        &user.actor(),
        ProjectAbility::ChangeStatus,
        Some(&project.scope()),
    ))?;
    let from = project.status;

    let project = ProjectRepo::set_status(&state.pool, id, input.status)
        .await?
        .ok_or_else(|| project_not_found(id))?;

    state
        .dispatch(
            event_for(&user, project.entity_ref(), ProjectAction::StatusChanged)
                .with_metadata(json!({ "from": from, "to": project.status })),
        )
        .await;

    Ok(ApiResponse::new("Project status updated", project))
}

/// POST /api/v1/projects/{id}/progress
pub async fn update_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProgress>,
) -> AppResult<Json<ApiResponse<Project>>> {
    input.validate()?;
    validate_progress(input.progress_percentage)?;
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(
        &user.actor(),
        ProjectAbility::UpdateProgress,
        Some(&project.scope()),
    ))?;

    let project = set_progress(&state, &user, &project, input.progress_percentage, false).await?;
    Ok(ApiResponse::new("Project progress updated", project))
}

/// POST /api/v1/projects/{id}/progress/recalculate
///
/// Progress becomes the rounded share of completed milestones.
pub async fn recalculate_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let project = find_project(&state.pool, id).await?;
    ensure(can_project(
        &user.actor(),
        ProjectAbility::UpdateProgress,
        Some(&project.scope()),
    ))?;

    let (total, completed) = ProjectRepo::milestone_counts(&state.pool, id).await?;
    let progress = progress_from_milestones(total, completed);

    let project = set_progress(&state, &user, &project, progress, true).await?;
    Ok(ApiResponse::new("Project progress recalculated", project))
}

async fn set_progress(
    state: &AppState,
    user: &AuthUser,
    project: &Project,
    progress: i32,
    recalculated: bool,
) -> AppResult<Project> {
    let from = project.progress_percentage;
    let updated = ProjectRepo::set_progress(&state.pool, project.id, progress)
        .await?
        .ok_or_else(|| project_not_found(project.id))?;

    state
        .dispatch(
            event_for(user, updated.entity_ref(), ProjectAction::ProgressUpdated).with_metadata(
                json!({
                    "from": from,
                    "to": updated.progress_percentage,
                    "recalculated": recalculated,
                }),
            ),
        )
        .await;

    Ok(updated)
}
