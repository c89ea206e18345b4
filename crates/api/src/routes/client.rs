//! Route definitions for the current user and client management.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::client;
use crate::state::AppState;

/// Routes mounted at `/clients`.
///
/// ```text
/// GET    /                            -> list (admin)
/// POST   /                            -> create (admin)
/// POST   /{id}/resend-invitation      -> resend_invitation (admin, throttled)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(client::list).post(client::create))
        .route("/{id}/resend-invitation", post(client::resend_invitation))
}
