//! Health, metrics and docs endpoint tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

use switchboard::providers::scripted::ScriptedProvider;

use crate::common::{chat_request, scripted_server, GatewayHarness};

#[tokio::test]
async fn test_health_all_providers_available() {
    let harness = GatewayHarness::new("openai").await;

    let response = harness.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["default_provider"], "openai");
    assert_eq!(body["checks"]["openai"]["available"], true);
    assert_eq!(body["checks"]["agent"]["available"], true);
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
    assert_eq!(body["stats"]["active_sessions"], 0);
}

#[tokio::test]
async fn test_health_degraded_when_default_unavailable() {
    let harness = GatewayHarness::with_config("agent", |config| {
        config.agent_id = None;
    })
    .await;

    let response = harness.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["agent"]["status"], "unhealthy");
    assert!(body["checks"]["agent"]["error"].is_string());
}

#[tokio::test]
async fn test_health_unhealthy_without_providers() {
    let server = scripted_server(vec![ScriptedProvider::new("openai").unavailable()]);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_readiness_follows_default_provider() {
    let ready = scripted_server(vec![ScriptedProvider::new("openai")]);
    ready.get("/health/ready").await.assert_status_ok();

    let not_ready = scripted_server(vec![
        ScriptedProvider::new("agent").unavailable(),
        ScriptedProvider::new("openai"),
    ]);
    let response = not_ready.get("/health/ready").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_liveness_always_ok() {
    let server = scripted_server(vec![ScriptedProvider::new("openai").unavailable()]);

    let response = server.get("/health/live").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint_is_prometheus_text() {
    switchboard::routes::metrics::init_metrics();
    let server = scripted_server(vec![ScriptedProvider::new("openai")]);

    server
        .post("/v1/chat/completions")
        .json(&chat_request("Hello"))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("switchboard_requests_total"));
}

#[tokio::test]
async fn test_openapi_lists_chat_endpoint() {
    let server = scripted_server(vec![ScriptedProvider::new("openai")]);

    let response = server.get("/openapi.json").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["paths"]["/v1/chat/completions"]["post"].is_object());
    assert!(body["paths"]["/v1/providers"]["get"].is_object());
}

#[tokio::test]
async fn test_cors_exposes_session_header() {
    let server = scripted_server(vec![ScriptedProvider::new("openai")]);

    let response = server
        .post("/v1/chat/completions")
        .add_header(
            axum::http::header::ORIGIN,
            axum::http::HeaderValue::from_static("https://app.example.com"),
        )
        .json(&chat_request("Hello"))
        .await;

    response.assert_status_ok();
    let exposed = response.header("access-control-expose-headers");
    assert!(exposed.to_str().unwrap().contains("x-session-id"));
}
