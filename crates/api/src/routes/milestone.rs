use axum::routing::{get, post};
use axum::Router;

use crate::handlers::milestone;
use crate::state::AppState;

/// Routes mounted at `/milestones`.
///
/// ```text
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// POST   /{id}/status     -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(milestone::get_by_id)
                .put(milestone::update)
                .delete(milestone::delete),
        )
        .route("/{id}/status", post(milestone::update_status))
}
