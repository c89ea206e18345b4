//! Route definitions for deliverables and their file versions.

use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{deliverable, deliverable_file};
use crate::state::AppState;

/// Routes mounted at `/deliverables`.
///
/// Only the upload route accepts bodies up to `max_upload_bytes`; every
/// other route keeps axum's default limit.
///
/// ```text
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// POST   /{id}/status                       -> change_status
/// POST   /{id}/approve                      -> approve
/// POST   /{id}/reject                       -> reject
///
/// GET    /{id}/files                        -> list
/// POST   /{id}/files                        -> upload (multipart `file`)
/// GET    /{id}/files/latest                 -> latest
/// GET    /{id}/files/{file_id}/download     -> download
/// DELETE /{id}/files/{file_id}              -> delete
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(deliverable::get_by_id)
                .put(deliverable::update)
                .delete(deliverable::delete),
        )
        .route("/{id}/status", post(deliverable::change_status))
        .route("/{id}/approve", post(deliverable::approve))
        .route("/{id}/reject", post(deliverable::reject))
        .route(
            "/{id}/files",
            get(deliverable_file::list)
                .post(deliverable_file::upload.layer(DefaultBodyLimit::max(max_upload_bytes))),
        )
        .route("/{id}/files/latest", get(deliverable_file::latest))
        .route(
            "/{id}/files/{file_id}/download",
            get(deliverable_file::download),
        )
        .route("/{id}/files/{file_id}", delete(deliverable_file::delete))
}
