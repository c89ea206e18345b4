use axum::routing::{get, post};
use axum::Router;

use crate::handlers::comment;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete (with replies)
/// POST   /{id}/replies      -> reply
/// POST   /{id}/read         -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(comment::get_by_id)
                .put(comment::update)
                .delete(comment::delete),
        )
        .route("/{id}/replies", post(comment::reply))
        .route("/{id}/read", post(comment::mark_read))
}
