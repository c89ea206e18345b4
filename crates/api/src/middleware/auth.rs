//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use portal_core::error::CoreError;
use portal_core::policy::Actor;
use portal_core::roles::Role;
use portal_core::types::UserId;
use portal_events::{EventActor, RequestContext};
use uuid::Uuid;

use super::request_meta::request_context;
use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The caller, extracted from a JWT Bearer token in the `Authorization`
/// header, together with where the request came from.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub context: RequestContext,
}

impl AuthUser {
    /// The caller as seen by the authorization policies.
    pub fn actor(&self) -> Actor {
        Actor::new(UserId(self.user_id), self.role)
    }

    /// The caller as recorded on dispatched actions.
    pub fn event_actor(&self) -> EventActor {
        EventActor {
            id: UserId(self.user_id),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
            context: request_context(parts),
        })
    }
}
