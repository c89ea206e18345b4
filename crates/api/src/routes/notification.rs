use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`. All scoped to the caller.
///
/// ```text
/// GET    /                  -> list (?unread_only=&limit=&offset=)
/// DELETE /                  -> clear_all
/// GET    /unread-count      -> unread_count
/// POST   /read-all          -> mark_all_read
/// POST   /{id}/read         -> mark_read
/// DELETE /{id}              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list).delete(notification::clear_all))
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
        .route("/{id}/read", post(notification::mark_read))
        .route("/{id}", delete(notification::delete))
}
