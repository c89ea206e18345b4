use axum::routing::{get, post};
use axum::Router;

use crate::handlers::meeting;
use crate::state::AppState;

/// Routes mounted at `/meetings`.
///
/// ```text
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// DELETE /{id}                -> delete (admin)
/// POST   /{id}/reschedule     -> reschedule
/// POST   /{id}/complete       -> complete
/// POST   /{id}/cancel         -> cancel
/// POST   /{id}/notes          -> add_notes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(meeting::get_by_id)
                .put(meeting::update)
                .delete(meeting::delete),
        )
        .route("/{id}/reschedule", post(meeting::reschedule))
        .route("/{id}/complete", post(meeting::complete))
        .route("/{id}/cancel", post(meeting::cancel))
        .route("/{id}/notes", post(meeting::add_notes))
}
