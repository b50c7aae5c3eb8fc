//! Common test utilities for Switchboard
//!
//! This module provides shared fixtures, the gateway test harness, and SSE
//! parsing helpers used across the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use switchboard::providers::scripted::ScriptedProvider;
use switchboard::{routes, AppState, CompletionProvider, Config, ProviderRegistry};

use crate::mocks::{MockAgentRuntime, MockOpenAI};

/// Test configuration constants
pub mod constants {
    /// Test API key for OpenAI
    pub const TEST_OPENAI_API_KEY: &str = "test-openai-api-key";
    /// Test API key for the agent runtime
    pub const TEST_AGENT_API_KEY: &str = "test-agent-api-key";
    /// Configured agent id
    pub const TEST_AGENT_ID: &str = "TESTAGENT";
    /// Configured agent alias id
    pub const TEST_AGENT_ALIAS_ID: &str = "TESTALIAS";
}

/// Config pointing both providers at the given base URLs
pub fn test_config(openai_api_url: &str, agent_runtime_url: &str, default_provider: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        default_provider: default_provider.to_string(),
        session_ttl_seconds: 3600,
        upstream_timeout_seconds: 10,
        openai_api_url: openai_api_url.to_string(),
        openai_api_key: Some(constants::TEST_OPENAI_API_KEY.to_string()),
        openai_model: "gpt-4o-mini".to_string(),
        agent_runtime_url: Some(agent_runtime_url.to_string()),
        agent_id: Some(constants::TEST_AGENT_ID.to_string()),
        agent_alias_id: Some(constants::TEST_AGENT_ALIAS_ID.to_string()),
        agent_api_key: Some(constants::TEST_AGENT_API_KEY.to_string()),
        agent_region: "us-east-1".to_string(),
    }
}

/// Serve the real router for a prepared state
pub fn serve(state: AppState) -> TestServer {
    let app = routes::create_router(Arc::new(state));
    TestServer::new(app).expect("Failed to create test server")
}

/// Gateway wired to mock OpenAI and agent upstreams
///
/// # Example
///
/// ```rust,ignore
/// let harness = GatewayHarness::new("agent").await;
/// harness.agent.mock_text("Hi there").await;
///
/// let response = harness.server.post("/v1/chat/completions").json(&chat_request("Hello")).await;
/// response.assert_status_ok();
/// ```
pub struct GatewayHarness {
    pub server: TestServer,
    pub openai: MockOpenAI,
    pub agent: MockAgentRuntime,
}

impl GatewayHarness {
    pub async fn new(default_provider: &str) -> Self {
        Self::with_config(default_provider, |_| {}).await
    }

    /// Build the harness after adjusting the config
    pub async fn with_config(default_provider: &str, adjust: impl FnOnce(&mut Config)) -> Self {
        let openai = MockOpenAI::start().await;
        let agent = MockAgentRuntime::start().await;

        let mut config = test_config(&openai.api_url(), &agent.uri(), default_provider);
        adjust(&mut config);

        let providers = ProviderRegistry::from_config(reqwest::Client::new(), &config);
        let server = serve(AppState::new_for_testing(config, providers));

        Self {
            server,
            openai,
            agent,
        }
    }
}

/// Gateway routing to scripted providers, the first one being the default
pub fn scripted_server(providers: Vec<ScriptedProvider>) -> TestServer {
    let default = providers.first().map(|p| p.name()).unwrap_or("openai");
    let registry = providers
        .into_iter()
        .fold(ProviderRegistry::new(default), |registry, provider| {
            registry.register(Arc::new(provider))
        });
    serve(AppState::new_for_testing(Config::for_testing(), registry))
}

/// A single-turn request body
pub fn chat_request(content: &str) -> Value {
    json!({"messages": [{"role": "user", "content": content}]})
}

/// A single-turn streaming request body
pub fn streaming_request(content: &str) -> Value {
    json!({"stream": true, "messages": [{"role": "user", "content": content}]})
}

/// One frame of an SSE response body
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Chunk(Value),
    Done,
}

impl SseFrame {
    pub fn chunk(&self) -> Option<&Value> {
        match self {
            SseFrame::Chunk(value) => Some(value),
            SseFrame::Done => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.chunk()?["choices"][0]["delta"]["content"].as_str()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.chunk()?["choices"][0]["finish_reason"].as_str()
    }

    pub fn is_role(&self) -> bool {
        self.chunk()
            .map(|c| c["choices"][0]["delta"]["role"] == "assistant")
            .unwrap_or(false)
    }
}

/// Parse an SSE body into frames, asserting every event is a single data line
pub fn parse_sse(body: &str) -> Vec<SseFrame> {
    assert!(body.ends_with("\n\n"), "SSE body must end with a blank line");

    body.split("\n\n")
        .filter(|event| !event.is_empty())
        .map(|event| {
            let payload = event
                .strip_prefix("data: ")
                .unwrap_or_else(|| panic!("unexpected SSE event: {:?}", event));
            assert!(!payload.contains('\n'), "event must be a single line");
            if payload == "[DONE]" {
                SseFrame::Done
            } else {
                SseFrame::Chunk(serde_json::from_str(payload).expect("chunk must be JSON"))
            }
        })
        .collect()
}

/// Concatenated `delta.content` of every frame
pub fn streamed_text(frames: &[SseFrame]) -> String {
    frames.iter().filter_map(SseFrame::content).collect()
}

/// Assert the frame envelope every stream must have
///
/// Exactly one role chunk, first; exactly one `[DONE]`, last; a finish chunk
/// with an empty delta right before `[DONE]`; identical `id` and `created`.
pub fn assert_stream_envelope(frames: &[SseFrame]) {
    assert!(frames.len() >= 3, "stream too short: {:?}", frames);
    assert!(frames[0].is_role(), "first frame must carry the role");
    assert_eq!(frames.iter().filter(|f| f.is_role()).count(), 1);

    assert_eq!(frames.last(), Some(&SseFrame::Done));
    assert_eq!(frames.iter().filter(|f| **f == SseFrame::Done).count(), 1);

    let finish = frames[frames.len() - 2].chunk().expect("finish chunk");
    assert_eq!(finish["choices"][0]["delta"], json!({}));
    assert!(finish["choices"][0]["finish_reason"].is_string());

    let first = frames[0].chunk().expect("role chunk");
    for frame in frames.iter().filter_map(SseFrame::chunk) {
        assert_eq!(frame["id"], first["id"]);
        assert_eq!(frame["created"], first["created"]);
        assert_eq!(frame["object"], "chat.completion.chunk");
    }
}
