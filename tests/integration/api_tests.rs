//! API integration tests
//!
//! Health probes, routing and the problem-details error envelope.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use crate::common::{test_config, TestApp};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health", None).await;

    response.assert_ok();
    let json = response.value();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;
    app.get("/api/v1/health/live", None).await.assert_ok();
}

#[tokio::test]
async fn test_request_timeout_layer_passes_fast_requests() {
    let mut config = test_config();
    config.server.request_timeout_secs = Some(5);
    let app = TestApp::with_config(config).await;

    app.get("/api/v1/health", None).await.assert_ok();
    app.get("/api/v1/nope", None).await.assert_not_found();
}

#[tokio::test]
async fn test_readiness_probe_reports_migrations() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health/ready", None).await;

    response.assert_ok();
    let json = response.value();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["database"]["status"], "healthy");
    assert!(json["migrations"]["applied"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    app.get("/api/v1/does-not-exist", None)
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/property", None).await;

    response.assert_unauthorized();
    let json = response.value();
    assert_eq!(json["status"], 401);
    assert_eq!(json["instance"], "/api/v1/property");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new().await;
    app.get("/api/v1/me", Some("not-a-jwt"))
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_malformed_json_is_problem_document() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let response = app.request(request).await;

    response.assert_bad_request();
    let json = response.value();
    assert_eq!(json["type"], "bad_request");
    assert_eq!(json["instance"], "/api/v1/auth/login");
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let app = TestApp::new().await;
    let response = app
        .post(
            "/api/v1/auth/admins/register",
            None,
            json!({ "email": "not-an-email", "full_name": "  ", "password": "x" }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.value();
    assert_eq!(json["type"], "validation_error");
    let errors = json["errors"].as_object().unwrap();
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("full_name"));
}

#[tokio::test]
async fn test_invalid_path_uuid_is_bad_request() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.get("/api/v1/property/items/not-a-uuid", admin.token())
        .await
        .assert_bad_request();
}
