use axum::routing::get;
use axum::Router;

use crate::handlers::activity;
use crate::state::AppState;

/// Routes mounted at `/activity` (admin only).
///
/// ```text
/// GET    /                  -> list (?subject_type=&subject_id=&limit=&offset=)
/// GET    /users/{id}        -> list_for_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(activity::list))
        .route("/users/{id}", get(activity::list_for_user))
}
