pub mod activity;
pub mod client;
pub mod comment;
pub mod credential;
pub mod deliverable;
pub mod health;
pub mod meeting;
pub mod milestone;
pub mod notification;
pub mod project;

use axum::routing::get;
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree. Every route requires a bearer token.
///
/// Route hierarchy:
///
/// ```text
/// /me                                          current user
///
/// /clients                                     list, create (admin)
/// /clients/{id}/resend-invitation              resend invitation (admin)
///
/// /projects                                    list, create
/// /projects/{id}                               get, update, delete
/// /projects/{id}/status                        change status
/// /projects/{id}/progress                      set progress
/// /projects/{id}/progress/recalculate          recalculate from milestones
/// /projects/{id}/milestones                    list, create
/// /projects/{id}/milestones/reorder            reorder
/// /projects/{id}/deliverables                  list, create
/// /projects/{id}/meetings                      list, schedule
/// /projects/{id}/credentials                   list, create
/// /projects/{id}/comments                      list for a subject, create
///
/// /milestones/{id}                             get, update, delete
/// /milestones/{id}/status                      change status
///
/// /deliverables/{id}                           get, update, delete
/// /deliverables/{id}/status                    change status
/// /deliverables/{id}/approve                   approve
/// /deliverables/{id}/reject                    reject
/// /deliverables/{id}/files                     list, upload
/// /deliverables/{id}/files/latest              latest version
/// /deliverables/{id}/files/{file_id}           delete
/// /deliverables/{id}/files/{file_id}/download  download
///
/// /meetings/{id}                               get, update, delete
/// /meetings/{id}/reschedule                    reschedule
/// /meetings/{id}/complete                      complete
/// /meetings/{id}/cancel                        cancel
/// /meetings/{id}/notes                         add notes
///
/// /credentials/{id}                            get, update, delete
/// /credentials/{id}/reveal                     reveal secret (admin)
///
/// /comments/{id}                               get, update, delete
/// /comments/{id}/replies                       reply
/// /comments/{id}/read                          mark read
///
/// /notifications                               list, clear all
/// /notifications/unread-count                  unread count
/// /notifications/read-all                      mark all read
/// /notifications/{id}                          delete
/// /notifications/{id}/read                     mark read
///
/// /activity                                    list (admin)
/// /activity/users/{id}                         list by user (admin)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::client::me))
        .nest("/clients", client::router())
        .nest("/projects", project::router())
        .nest("/milestones", milestone::router())
        .nest("/deliverables", deliverable::router(config.max_upload_bytes))
        .nest("/meetings", meeting::router())
        .nest("/credentials", credential::router())
        .nest("/comments", comment::router())
        .nest("/notifications", notification::router())
        .nest("/activity", activity::router())
}
