//! Handlers for meetings.
//!
//! Responses carry the computed `end_time` and `is_upcoming` fields.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::actions::MeetingAction;
use portal_core::error::CoreError;
use portal_core::meeting::{
    ensure_open, validate_duration, MeetingStatus, DEFAULT_DURATION_MINUTES, DEFAULT_LOCATION,
};
use portal_core::policy::{can_meeting, ensure, MeetingAbility, ProjectScope};
use portal_db::models::meeting::{
    AddMeetingNotes, CompleteMeeting, Meeting, MeetingView, RescheduleMeeting, ScheduleMeeting,
    UpdateMeeting,
};
use portal_db::repositories::meeting_repo::NewMeeting;
use portal_db::repositories::{DeliverableRepo, MeetingRepo};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_project};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MeetingListParams {
    /// Only meetings scheduled in the future.
    #[serde(default)]
    pub upcoming: bool,
}

async fn load(state: &AppState, id: Uuid) -> AppResult<(Meeting, ProjectScope)> {
    let meeting = MeetingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Meeting", id))?;
    let project = find_project(&state.pool, meeting.project_id).await?;
    Ok((meeting, project.scope()))
}

fn view(meeting: Meeting) -> MeetingView {
    MeetingView::new(meeting, Utc::now())
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::not_found("Meeting", id)
}

/// GET /api/v1/projects/{project_id}/meetings?upcoming=
pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<MeetingListParams>,
) -> AppResult<Json<ApiResponse<Vec<MeetingView>>>> {
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_meeting(&actor, MeetingAbility::ViewAny, None))?;
    ensure(can_meeting(&actor, MeetingAbility::View, Some(&project.scope())))?;

    let now = Utc::now();
    let upcoming_after = params.upcoming.then_some(now);
    let meetings = MeetingRepo::list_by_project(&state.pool, project_id, upcoming_after)
        .await?
        .into_iter()
        .map(|m| MeetingView::new(m, now))
        .collect();
    Ok(ApiResponse::new("Meetings retrieved", meetings))
}

/// POST /api/v1/projects/{project_id}/meetings
pub async fn schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<ScheduleMeeting>,
) -> AppResult<(StatusCode, Json<ApiResponse<MeetingView>>)> {
    input.validate()?;
    let duration_minutes = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    validate_duration(duration_minutes)?;

    let project = find_project(&state.pool, project_id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Create, Some(&project.scope())))?;

    if let Some(deliverable_id) = input.deliverable_id {
        let deliverable = DeliverableRepo::find_by_id(&state.pool, deliverable_id).await?;
        if !deliverable.is_some_and(|d| d.project_id == project_id) {
            return Err(CoreError::Validation(
                "deliverable_id must reference a deliverable of this project".into(),
            )
            .into());
        }
    }

    let meeting = MeetingRepo::create(
        &state.pool,
        &NewMeeting {
            project_id,
            deliverable_id: input.deliverable_id,
            title: input.title,
            description: input.description,
            scheduled_at: input.scheduled_at,
            duration_minutes,
            location: input.location.unwrap_or(DEFAULT_LOCATION),
            meeting_link: input.meeting_link,
            scheduled_by: Some(user.user_id),
        },
    )
    .await?;

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Scheduled).with_metadata(json!({
                "title": meeting.title,
                "scheduled_at": meeting.scheduled_at,
            })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Meeting scheduled", view(meeting)),
    ))
}

/// GET /api/v1/meetings/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    let (meeting, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::View, Some(&scope)))?;
    Ok(ApiResponse::new("Meeting retrieved", view(meeting)))
}

/// PUT /api/v1/meetings/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMeeting>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    input.validate()?;
    let (_, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Update, Some(&scope)))?;

    let meeting = MeetingRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Updated)
                .with_metadata(json!({ "title": meeting.title })),
        )
        .await;

    Ok(ApiResponse::new("Meeting updated", view(meeting)))
}

/// POST /api/v1/meetings/{id}/reschedule
pub async fn reschedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<RescheduleMeeting>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    if let Some(minutes) = input.duration_minutes {
        validate_duration(minutes)?;
    }
    let (meeting, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Reschedule, Some(&scope)))?;
    ensure_open(meeting.status)?;

    let previous_scheduled_at = meeting.scheduled_at;
    let meeting =
        MeetingRepo::reschedule(&state.pool, id, input.scheduled_at, input.duration_minutes)
            .await?
            .ok_or_else(|| not_found(id))?;

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Rescheduled).with_metadata(
                json!({
                    "previous_scheduled_at": previous_scheduled_at,
                    "scheduled_at": meeting.scheduled_at,
                }),
            ),
        )
        .await;

    Ok(ApiResponse::new("Meeting rescheduled", view(meeting)))
}

/// POST /api/v1/meetings/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CompleteMeeting>>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    let (meeting, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Complete, Some(&scope)))?;
    ensure_open(meeting.status)?;

    let meeting =
        MeetingRepo::set_status(&state.pool, id, MeetingStatus::Completed, input.notes.as_deref())
            .await?
            .ok_or_else(|| not_found(id))?;

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Completed)
                .with_metadata(json!({ "title": meeting.title })),
        )
        .await;

    Ok(ApiResponse::new("Meeting completed", view(meeting)))
}

/// POST /api/v1/meetings/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    let (meeting, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Cancel, Some(&scope)))?;
    ensure_open(meeting.status)?;

    let meeting = MeetingRepo::set_status(&state.pool, id, MeetingStatus::Cancelled, None)
        .await?
        .ok_or_else(|| not_found(id))?;

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Cancelled)
                .with_metadata(json!({ "title": meeting.title })),
        )
        .await;

    Ok(ApiResponse::new("Meeting cancelled", view(meeting)))
}

/// POST /api/v1/meetings/{id}/notes
pub async fn add_notes(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AddMeetingNotes>,
) -> AppResult<Json<ApiResponse<MeetingView>>> {
    input.validate()?;
    let (_, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::AddNotes, Some(&scope)))?;

    let meeting = MeetingRepo::set_notes(&state.pool, id, &input.notes)
        .await?
        .ok_or_else(|| not_found(id))?;

    state
        .dispatch(event_for(&user, meeting.entity_ref(), MeetingAction::NotesAdded))
        .await;

    Ok(ApiResponse::new("Meeting notes added", view(meeting)))
}

/// DELETE /api/v1/meetings/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (meeting, scope) = load(&state, id).await?;
    ensure(can_meeting(&user.actor(), MeetingAbility::Delete, Some(&scope)))?;

    if !MeetingRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id).into());
    }

    state
        .dispatch(
            event_for(&user, meeting.entity_ref(), MeetingAction::Deleted)
                .with_metadata(json!({ "title": meeting.title })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
