//! Provider listing tests

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use switchboard::providers::scripted::ScriptedProvider;

use crate::common::{scripted_server, GatewayHarness};

#[tokio::test]
async fn test_list_configured_providers() {
    let harness = GatewayHarness::new("openai").await;

    let response = harness.server.get("/v1/providers").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(
        body,
        json!({
            "providers": [
                {
                    "name": "openai",
                    "display_name": "OpenAI",
                    "available": true,
                    "default_model": "gpt-4o-mini"
                },
                {
                    "name": "agent",
                    "display_name": "Agent",
                    "available": true,
                    "default_model": "agent"
                }
            ],
            "default": "openai"
        })
    );
}

#[tokio::test]
async fn test_unconfigured_provider_is_listed_unavailable() {
    let harness = GatewayHarness::with_config("openai", |config| {
        config.agent_api_key = None;
    })
    .await;

    let body: Value = harness.server.get("/v1/providers").await.json();
    let agent = &body["providers"][1];
    assert_eq!(agent["name"], "agent");
    assert_eq!(agent["available"], false);
    assert_eq!(agent["default_model"], Value::Null);
}

#[tokio::test]
async fn test_missing_openai_key_makes_requests_unavailable() {
    let harness = GatewayHarness::with_config("agent", |config| {
        config.openai_api_key = None;
    })
    .await;

    let response = harness
        .server
        .post("/v1/chat/completions")
        .json(&json!({
            "provider": "openai",
            "messages": [{"role": "user", "content": "Hello"}]
        }))
        .await;

    assert_eq!(response.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert!(harness.openai.received_bodies().await.is_empty());
}

#[tokio::test]
async fn test_listing_reports_default_name() {
    let server = scripted_server(vec![
        ScriptedProvider::new("agent").with_default_model("agent-v2"),
        ScriptedProvider::new("openai"),
    ]);

    let body: Value = server.get("/v1/providers").await.json();
    assert_eq!(body["default"], "agent");
    assert_eq!(body["providers"][0]["default_model"], "agent-v2");
    assert_eq!(body["providers"].as_array().unwrap().len(), 2);
}
