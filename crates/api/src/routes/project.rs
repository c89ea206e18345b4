//! Route definitions for the `/projects` resource.
//!
//! Also nests the project-scoped collections (milestones, deliverables,
//! meetings, credentials, comments) under `/projects/{id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{comment, credential, deliverable, meeting, milestone, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// POST   /{id}/status                       -> change_status
/// POST   /{id}/progress                     -> update_progress
/// POST   /{id}/progress/recalculate         -> recalculate_progress
///
/// GET    /{id}/milestones                   -> list_by_project
/// POST   /{id}/milestones                   -> create
/// POST   /{id}/milestones/reorder           -> reorder
///
/// GET    /{id}/deliverables                 -> list_by_project (?milestone_id=)
/// POST   /{id}/deliverables                 -> create
///
/// GET    /{id}/meetings                     -> list_by_project (?upcoming=)
/// POST   /{id}/meetings                     -> schedule
///
/// GET    /{id}/credentials                  -> list_by_project
/// POST   /{id}/credentials                  -> create
///
/// GET    /{id}/comments                     -> list (?commentable_type=&commentable_id=)
/// POST   /{id}/comments                     -> create
/// ```
pub fn router() -> Router<AppState> {
    let milestone_routes = Router::new()
        .route("/", get(milestone::list_by_project).post(milestone::create))
        .route("/reorder", post(milestone::reorder));

    let deliverable_routes = Router::new().route(
        "/",
        get(deliverable::list_by_project).post(deliverable::create),
    );

    let meeting_routes =
        Router::new().route("/", get(meeting::list_by_project).post(meeting::schedule));

    let credential_routes = Router::new().route(
        "/",
        get(credential::list_by_project).post(credential::create),
    );

    let comment_routes = Router::new().route("/", get(comment::list).post(comment::create));

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/status", post(project::change_status))
        .route("/{id}/progress", post(project::update_progress))
        .route(
            "/{id}/progress/recalculate",
            post(project::recalculate_progress),
        )
        .nest("/{id}/milestones", milestone_routes)
        .nest("/{id}/deliverables", deliverable_routes)
        .nest("/{id}/meetings", meeting_routes)
        .nest("/{id}/credentials", credential_routes)
        .nest("/{id}/comments", comment_routes)
}
