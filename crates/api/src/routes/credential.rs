use axum::routing::{get, post};
use axum::Router;

use crate::handlers::credential;
use crate::state::AppState;

/// Routes mounted at `/credentials`.
///
/// ```text
/// GET    /{id}            -> get_by_id (metadata only)
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// POST   /{id}/reveal     -> reveal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(credential::get_by_id)
                .put(credential::update)
                .delete(credential::delete),
        )
        .route("/{id}/reveal", post(credential::reveal))
}
