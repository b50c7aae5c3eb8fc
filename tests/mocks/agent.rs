//! Mock agent runtime for testing
//!
//! Mocks `POST /agents/{agentId}/agentAliases/{aliasId}/sessions/{sessionId}/text`,
//! answering with newline-delimited JSON events.

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

use crate::common::constants::TEST_AGENT_API_KEY;

const INVOKE_PATH: &str = r"^/agents/[^/]+/agentAliases/[^/]+/sessions/[^/]+/text$";

/// Mock agent runtime wrapper
pub struct MockAgentRuntime {
    server: MockServer,
}

impl MockAgentRuntime {
    /// Start a new mock agent runtime
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure as `AGENT_RUNTIME_URL`
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Mock a reply made of the given events
    pub async fn mock_events(&self, events: &[Value]) {
        Mock::given(method("POST"))
            .and(path_regex(INVOKE_PATH))
            .and(header(
                "Authorization",
                format!("Bearer {}", TEST_AGENT_API_KEY).as_str(),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ndjson(events))
                    .insert_header("Content-Type", "application/x-ndjson"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a reply consisting of one text chunk
    pub async fn mock_text(&self, text: &str) {
        self.mock_events(&[chunk_event(text)]).await;
    }

    /// Mock an error status
    pub async fn mock_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path_regex(INVOKE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Every request received so far
    pub async fn received(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Backend session ids from the request paths, in arrival order
    pub async fn session_handles(&self) -> Vec<String> {
        self.received()
            .await
            .iter()
            .filter_map(|r| {
                let segments: Vec<&str> = r.url.path().split('/').collect();
                segments
                    .iter()
                    .position(|s| *s == "sessions")
                    .and_then(|i| segments.get(i + 1))
                    .map(|s| s.to_string())
            })
            .collect()
    }
}

/// A chunk event carrying reply text
pub fn chunk_event(text: &str) -> Value {
    json!({"chunk": {"bytes": text}})
}

/// A trace event carrying the orchestration's final response
pub fn final_response_trace(text: &str) -> Value {
    json!({
        "trace": {
            "trace": {
                "orchestrationTrace": {
                    "observation": {"finalResponse": {"text": text}}
                }
            }
        }
    })
}

/// A trace event without an answer
pub fn rationale_trace() -> Value {
    json!({
        "trace": {
            "trace": {
                "orchestrationTrace": {"rationale": {"text": "Thinking about it"}}
            }
        }
    })
}

/// A runtime exception event
pub fn exception_event(name: &str, message: &str) -> Value {
    let mut event = serde_json::Map::new();
    event.insert(name.to_string(), json!({"message": message}));
    Value::Object(event)
}

fn ndjson(events: &[Value]) -> String {
    events.iter().map(|e| format!("{}\n", e)).collect()
}
