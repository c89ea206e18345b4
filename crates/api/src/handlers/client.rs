//! Handlers for the current user and client management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::actions::ClientAction;
use portal_core::error::CoreError;
use portal_core::policy::{can_client, ensure, ClientAbility};
use portal_core::roles::Role;
use portal_core::types::{EntityRef, UserId};
use portal_db::models::user::{CreateClientRequest, CreateUser, User};
use portal_db::repositories::UserRepo;
use portal_events::{send_detached, MailTemplate};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::event_for;
use crate::auth::password::{generate_temporary_password, hash_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

fn hash_temporary(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// Queue the invitation email. Delivery failures are only logged.
fn send_invitation(state: &AppState, user: &User, temporary_password: &str) {
    send_detached(
        state.mailer.clone(),
        user.email.clone(),
        MailTemplate::Invitation,
        json!({
            "name": user.name,
            "email": user.email,
            "temporary_password": temporary_password,
        }),
    );
}

/// GET /api/v1/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let me = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("Account no longer exists".into()))?;
    Ok(ApiResponse::new("User retrieved", me))
}

/// GET /api/v1/clients
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    ensure(can_client(&user.actor(), ClientAbility::ViewAny))?;
    let clients = UserRepo::list_by_role(&state.pool, Role::Client).await?;
    Ok(ApiResponse::new("Clients retrieved", clients))
}

/// POST /api/v1/clients
///
/// Creates the client with a temporary password and emails the invitation.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateClientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    ensure(can_client(&user.actor(), ClientAbility::Create))?;
    input.validate()?;

    let temporary_password = generate_temporary_password();
    let client = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: input.name,
            email: input.email,
            password_hash: hash_temporary(&temporary_password)?,
            role: Role::Client,
        },
    )
    .await?;

    send_invitation(&state, &client, &temporary_password);

    let subject = EntityRef::User(UserId(client.id));
    state
        .dispatch_all(vec![
            event_for(&user, subject, ClientAction::Created)
                .with_metadata(json!({ "name": client.name, "email": client.email })),
            event_for(&user, subject, ClientAction::InvitationSent)
                .with_metadata(json!({ "email": client.email })),
        ])
        .await;

    Ok((StatusCode::CREATED, ApiResponse::new("Client created", client)))
}

/// POST /api/v1/clients/{id}/resend-invitation
///
/// Issues a fresh temporary password. Throttled per client and per address.
pub async fn resend_invitation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    ensure(can_client(&user.actor(), ClientAbility::ResendInvitation))?;

    let client = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    if client.role != Role::Client {
        return Err(CoreError::Validation("Invitations can only be sent to clients".into()).into());
    }

    let address = user.context.ip_address.as_deref().unwrap_or("unknown");
    state.rate_limiter.check_resend(id, address)?;

    let temporary_password = generate_temporary_password();
    if !UserRepo::set_password_hash(&state.pool, id, &hash_temporary(&temporary_password)?).await? {
        return Err(CoreError::not_found("User", id).into());
    }

    send_invitation(&state, &client, &temporary_password);

    state
        .dispatch(
            event_for(&user, EntityRef::User(UserId(client.id)), ClientAction::InvitationSent)
                .with_metadata(json!({ "email": client.email, "resent": true })),
        )
        .await;

    Ok(ApiResponse::new("Invitation resent", client))
}
