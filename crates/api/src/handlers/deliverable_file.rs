//! Handlers for versioned deliverable files.
//!
//! Uploads are stored first and recorded second; if recording fails the
//! stored object is removed again.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use portal_core::actions::DeliverableAction;
use portal_core::deliverable::{storage_dir, stored_filename};
use portal_core::error::CoreError;
use portal_core::policy::{can_deliverable, ensure, DeliverableAbility};
use portal_core::types::ProjectId;
use portal_db::models::deliverable::Deliverable;
use portal_db::models::deliverable_file::{CreateDeliverableFile, DeliverableFile};
use portal_db::repositories::DeliverableFileRepo;
use serde_json::json;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::deliverable::load;
use super::event_for;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

struct Upload {
    original_filename: String,
    mime_type: Option<String>,
    bytes: axum::body::Bytes,
}

/// Pull the `file` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_filename = field
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("upload")
            .to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(CoreError::Validation("The uploaded file is empty".into()).into());
        }
        return Ok(Upload {
            original_filename,
            mime_type,
            bytes,
        });
    }
    Err(CoreError::Validation(format!("Missing '{FILE_FIELD}' field")).into())
}

/// A live file of `deliverable`, or 404.
async fn find_file(
    state: &AppState,
    deliverable: &Deliverable,
    file_id: Uuid,
) -> AppResult<DeliverableFile> {
    DeliverableFileRepo::find_by_id(&state.pool, file_id)
        .await?
        .filter(|f| f.deliverable_id == deliverable.id)
        .ok_or_else(|| CoreError::not_found("DeliverableFile", file_id).into())
}

/// POST /api/v1/deliverables/{id}/files
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<DeliverableFile>>)> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::UploadFile, Some(&scope)))?;

    let upload = read_upload(&mut multipart).await?;
    let filename = stored_filename(&upload.original_filename);
    let key = format!(
        "{}/{filename}",
        storage_dir(ProjectId(deliverable.project_id))
    );
    let size_bytes = state.storage.put(&key, &upload.bytes).await?;

    let input = CreateDeliverableFile {
        deliverable_id: deliverable.id,
        filename,
        original_filename: upload.original_filename,
        storage_path: key.clone(),
        size_bytes: i64::try_from(size_bytes).unwrap_or(i64::MAX),
        mime_type: upload.mime_type,
        uploaded_by: Some(user.user_id),
    };

    let file = match DeliverableFileRepo::create_latest(&state.pool, &input).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&key).await {
                tracing::warn!(error = %cleanup, key, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::FileUploaded)
                .with_metadata(json!({
                    "file_id": file.id,
                    "original_filename": file.original_filename,
                    "version": file.version,
                })),
        )
        .await;

    Ok((StatusCode::CREATED, ApiResponse::new("File uploaded", file)))
}

/// GET /api/v1/deliverables/{id}/files
///
/// Every live version, newest first.
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<DeliverableFile>>>> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::View, Some(&scope)))?;

    let files = DeliverableFileRepo::list_by_deliverable(&state.pool, deliverable.id).await?;
    Ok(ApiResponse::new("Files retrieved", files))
}

/// GET /api/v1/deliverables/{id}/files/latest
pub async fn latest(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliverableFile>>> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::View, Some(&scope)))?;

    let file = DeliverableFileRepo::find_latest(&state.pool, deliverable.id)
        .await?
        .ok_or_else(|| CoreError::not_found("DeliverableFile", deliverable.id))?;
    Ok(ApiResponse::new("Latest file retrieved", file))
}

/// GET /api/v1/deliverables/{id}/files/{file_id}/download
///
/// Streams the stored object and counts the download.
pub async fn download(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::DownloadFile, Some(&scope)))?;
    let file = find_file(&state, &deliverable, file_id).await?;

    let (handle, size) = state.storage.open(&file.storage_path).await?;
    let download_count = DeliverableFileRepo::increment_download_count(&state.pool, file.id).await?;

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::FileDownloaded)
                .with_metadata(json!({
                    "file_id": file.id,
                    "download_count": download_count,
                })),
        )
        .await;

    let content_type = file
        .mime_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        file.original_filename.replace(['"', '\\', '\r', '\n'], "_")
    );

    let mut response = Response::new(Body::from_stream(ReaderStream::new(handle)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// DELETE /api/v1/deliverables/{id}/files/{file_id}
///
/// If the deleted file was the latest, the highest remaining version takes
/// its place.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let (deliverable, scope) = load(&state, id).await?;
    ensure(can_deliverable(&user.actor(), DeliverableAbility::DeleteFile, Some(&scope)))?;
    let file = find_file(&state, &deliverable, file_id).await?;

    if !DeliverableFileRepo::soft_delete(&state.pool, file.id).await? {
        return Err(CoreError::not_found("DeliverableFile", file.id).into());
    }

    if let Err(e) = state.storage.delete(&file.storage_path).await {
        tracing::warn!(error = %e, key = %file.storage_path, "Failed to remove stored file");
    }

    state
        .dispatch(
            event_for(&user, deliverable.entity_ref(), DeliverableAction::FileDeleted)
                .with_metadata(json!({ "file_id": file.id, "version": file.version })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
