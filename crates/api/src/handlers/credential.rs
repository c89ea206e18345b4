//! Handlers for project credentials.
//!
//! Secrets are encrypted before they reach the database and only leave it
//! through `reveal`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::actions::CredentialAction;
use portal_core::error::CoreError;
use portal_core::policy::{can_credential, ensure, CredentialAbility, ProjectScope};
use portal_db::models::credential::{
    CreateCredential, CreateCredentialRequest, Credential, RevealedSecret, UpdateCredential,
    UpdateCredentialRequest,
};
use portal_db::repositories::CredentialRepo;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{event_for, find_project};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

async fn load(state: &AppState, id: Uuid) -> AppResult<(Credential, ProjectScope)> {
    let credential = CredentialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Credential", id))?;
    let project = find_project(&state.pool, credential.project_id).await?;
    Ok((credential, project.scope()))
}

/// GET /api/v1/projects/{project_id}/credentials
pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Credential>>>> {
    let project = find_project(&state.pool, project_id).await?;
    let actor = user.actor();
    ensure(can_credential(&actor, CredentialAbility::ViewAny, None))?;
    ensure(can_credential(&actor, CredentialAbility::View, Some(&project.scope())))?;

    let credentials = CredentialRepo::list_by_project(&state.pool, project_id).await?;
    Ok(ApiResponse::new("Credentials retrieved", credentials))
}

/// POST /api/v1/projects/{project_id}/credentials
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<CreateCredentialRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Credential>>)> {
    input.validate()?;
    let project = find_project(&state.pool, project_id).await?;
    ensure(can_credential(&user.actor(), CredentialAbility::Create, Some(&project.scope())))?;

    let encrypted_secret = state.cipher.encrypt(&input.secret)?;
    let credential = CredentialRepo::create(
        &state.pool,
        &CreateCredential {
            project_id,
            name: input.name,
            kind: input.kind,
            username: input.username,
            url: input.url,
            encrypted_secret,
            notes: input.notes,
            metadata: input.metadata.unwrap_or_else(|| json!({})),
            created_by: Some(user.user_id),
        },
    )
    .await?;

    state
        .dispatch(
            event_for(&user, credential.entity_ref(), CredentialAction::Created)
                .with_metadata(json!({ "name": credential.name, "type": credential.kind })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Credential created", credential),
    ))
}

/// GET /api/v1/credentials/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Credential>>> {
    let (credential, scope) = load(&state, id).await?;
    ensure(can_credential(&user.actor(), CredentialAbility::View, Some(&scope)))?;
    Ok(ApiResponse::new("Credential retrieved", credential))
}

/// PUT /api/v1/credentials/{id}
///
/// The secret is re-encrypted only when a non-empty one is supplied.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCredentialRequest>,
) -> AppResult<Json<ApiResponse<Credential>>> {
    input.validate()?;
    let (_, scope) = load(&state, id).await?;
    ensure(can_credential(&user.actor(), CredentialAbility::Update, Some(&scope)))?;

    let encrypted_secret = match input.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => Some(state.cipher.encrypt(secret)?),
        None => None,
    };
    let secret_changed = encrypted_secret.is_some();

    let credential = CredentialRepo::update(
        &state.pool,
        id,
        &UpdateCredential {
            name: input.name,
            kind: input.kind,
            username: input.username,
            url: input.url,
            encrypted_secret,
            notes: input.notes,
            metadata: input.metadata,
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Credential", id))?;

    state
        .dispatch(
            event_for(&user, credential.entity_ref(), CredentialAction::Updated).with_metadata(
                json!({ "name": credential.name, "secret_changed": secret_changed }),
            ),
        )
        .await;

    Ok(ApiResponse::new("Credential updated", credential))
}

/// POST /api/v1/credentials/{id}/reveal
///
/// Every reveal is stamped on the row and logged; the secret itself never
/// enters the event.
pub async fn reveal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RevealedSecret>>> {
    let (credential, scope) = load(&state, id).await?;
    ensure(can_credential(&user.actor(), CredentialAbility::Reveal, Some(&scope)))?;

    let secret = state.cipher.decrypt(&credential.encrypted_secret)?;
    let accessed_at = Utc::now();
    if !CredentialRepo::touch_last_accessed(&state.pool, id, accessed_at).await? {
        return Err(CoreError::not_found("Credential", id).into());
    }

    state
        .dispatch(
            event_for(&user, credential.entity_ref(), CredentialAction::Accessed)
                .with_metadata(json!({ "name": credential.name })),
        )
        .await;

    Ok(ApiResponse::new(
        "Credential revealed",
        RevealedSecret { secret, accessed_at },
    ))
}

/// DELETE /api/v1/credentials/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let (credential, scope) = load(&state, id).await?;
    ensure(can_credential(&user.actor(), CredentialAbility::Delete, Some(&scope)))?;

    if !CredentialRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::not_found("Credential", id).into());
    }

    state
        .dispatch(
            event_for(&user, credential.entity_ref(), CredentialAction::Deleted)
                .with_metadata(json!({ "name": credential.name })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
