//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly and need neither a server nor a
//! database.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use portal_api::error::AppError;
use portal_core::error::CoreError;
use uuid::Uuid;
use validator::Validate;

/// Helper: convert an `AppError` into its status, headers and parsed body.
async fn error_to_response(err: AppError) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, headers, json)
}

#[tokio::test]
async fn not_found_hides_the_entity() {
    let err = AppError::Core(CoreError::not_found("Project", Uuid::new_v4()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["msg"], "Resource not found");
    assert!(json["errors"].is_null());
}

#[tokio::test]
async fn domain_validation_returns_422_with_message() {
    let err = AppError::Core(CoreError::Validation("progress must be between 0 and 100".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["msg"], "progress must be between 0 and 100");
}

#[derive(Validate)]
struct Signup {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    name: String,
}

#[tokio::test]
async fn field_validation_lists_every_failed_field() {
    let errors = Signup {
        email: "not-an-email".into(),
        name: String::new(),
    }
    .validate()
    .unwrap_err();

    let (status, _, json) = error_to_response(AppError::Validation(errors)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["msg"], "The given data was invalid");
    assert!(json["errors"]["email"].is_array());
    assert!(json["errors"]["name"].is_array());
}

#[tokio::test]
async fn conflict_returns_409() {
    let err = AppError::Core(CoreError::Conflict("duplicate email".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["msg"], "duplicate email");
}

#[tokio::test]
async fn forbidden_returns_generic_403() {
    let err = AppError::Core(CoreError::Forbidden("client does not own project".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["msg"], "Forbidden");
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["msg"], "Invalid or expired token");
}

#[tokio::test]
async fn rate_limited_sets_retry_after() {
    let err = AppError::Core(CoreError::RateLimited {
        retry_after_secs: 42,
    });

    let (status, headers, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers[header::RETRY_AFTER], "42");
    assert_eq!(json["errors"]["retry_after"], 42);
}

#[tokio::test]
async fn dependency_failure_is_sanitized() {
    let err = AppError::Core(CoreError::DependencyFailure(
        "aes-gcm: authentication tag mismatch".into(),
    ));

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["msg"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, _, _) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_request_returns_400() {
    let err = AppError::BadRequest("Invalid multipart body".into());

    let (status, _, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["msg"], "Invalid multipart body");
}
