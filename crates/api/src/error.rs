use std::collections::BTreeMap;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use portal_core::error::CoreError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every variant renders as a `{ "msg": ..., "errors": ... }` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `portal_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body failed `validator` checks.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => {
                    tracing::debug!(entity, %id, "Resource not found");
                    (StatusCode::NOT_FOUND, "Resource not found".to_string(), Value::Null)
                }
                CoreError::Validation(msg) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, msg.clone(), Value::Null)
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), Value::Null),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, msg.clone(), Value::Null)
                }
                CoreError::Forbidden(_) => {
                    (StatusCode::FORBIDDEN, "Forbidden".to_string(), Value::Null)
                }
                CoreError::RateLimited { retry_after_secs } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests".to_string(),
                    json!({ "retry_after": retry_after_secs }),
                ),
                CoreError::DependencyFailure(msg) => {
                    tracing::error!(error = %msg, "Dependency failure");
                    internal()
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "The given data was invalid".to_string(),
                field_messages(errors),
            ),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), Value::Null),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "msg": message,
            "errors": errors,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::Core(CoreError::RateLimited { retry_after_secs }) = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }
        response
    }
}

fn internal() -> (StatusCode, String, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_MESSAGE.to_string(),
        Value::Null,
    )
}

/// `{field: [message, ...]}` for every failed field.
fn field_messages(errors: &validator::ValidationErrors) -> Value {
    let fields: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("The {field} field is invalid ({})", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();
    json!(fields)
}

/// Classify a sqlx error into an HTTP status and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (`23505`) map to 409.
/// - Foreign-key violations (`23503`) map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, String, Value) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "Resource not found".to_string(),
            Value::Null,
        ),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => {
                tracing::debug!(constraint = ?db_err.constraint(), "Unique violation");
                (
                    StatusCode::CONFLICT,
                    "The resource already exists".to_string(),
                    Value::Null,
                )
            }
            Some("23503") => (
                StatusCode::BAD_REQUEST,
                "A referenced resource does not exist".to_string(),
                Value::Null,
            ),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                internal()
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
