//! Router-level tests for requests that are answered before any query
//! runs: health, authentication, role checks and body validation.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, get, send, token_for, unreachable_pool};
use portal_core::roles::Role;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = build_test_app(unreachable_pool());
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
    assert_eq!(json["subscribers"], json!([]));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(unreachable_pool());
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["msg"], "Route not found");
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let response = get(app, "/api/v1/projects").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["msg"].is_string());
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let response = send(
        app,
        Method::GET,
        "/api/v1/projects",
        Some("not.a.token"),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["msg"], "Invalid or expired token");
}

#[tokio::test]
async fn clients_cannot_list_clients() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Client);
    let response = send(app, Method::GET, "/api/v1/clients", Some(&token), None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn clients_cannot_create_clients() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Client);
    let response = send(
        app,
        Method::POST,
        "/api/v1/clients",
        Some(&token),
        Some(json!({ "name": "Ada", "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn clients_cannot_read_activity() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Client);

    let response = send(app.clone(), Method::GET, "/api/v1/activity", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/activity/users/{}", Uuid::new_v4());
    let response = send(app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn client_with_invalid_email_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Admin);
    let response = send(
        app,
        Method::POST,
        "/api/v1/clients",
        Some(&token),
        Some(json!({ "name": "Ada", "email": "not-an-email" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["msg"], "The given data was invalid");
    assert!(json["errors"]["email"].is_array());
}

#[tokio::test]
async fn progress_above_100_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Admin);
    let uri = format!("/api/v1/projects/{}/progress", Uuid::new_v4());
    let response = send(
        app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "progress_percentage": 150 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn zero_length_meeting_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Admin);
    let uri = format!("/api/v1/projects/{}/meetings", Uuid::new_v4());
    let response = send(
        app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({
            "title": "Kickoff",
            "scheduled_at": "2026-11-02T10:00:00Z",
            "duration_minutes": 0,
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn credential_without_secret_is_rejected() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Admin);
    let uri = format!("/api/v1/projects/{}/credentials", Uuid::new_v4());
    let response = send(
        app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "name": "Staging DB", "type": "database", "secret": "" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["errors"]["secret"].is_array());
}

#[tokio::test]
async fn comments_cannot_attach_to_meetings() {
    let app = build_test_app(unreachable_pool());
    let token = token_for(Role::Admin);
    let uri = format!("/api/v1/projects/{}/comments", Uuid::new_v4());
    let response = send(
        app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({
            "commentable_type": "meeting",
            "commentable_id": Uuid::new_v4(),
            "body": "Looks good",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
