//! Conversational agent runtime adapter
//!
//! The agent keeps conversation history server-side per session, so only the
//! latest user turn is sent. Replies come back as newline-delimited JSON events
//! carrying whole messages.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::{
    error_from_response, log_reply, log_request, Completion, CompletionProvider, Delivery,
    ProviderCall, ProviderError, ProviderEvent, ProviderStream,
};
use crate::config::Config;
use crate::streaming::{decode_body, decode_stream, LineDecoder};
use crate::wire::FinishReason;

const EMPTY_REPLY: &str =
    "I apologize, but I received no response from the agent. How else can I assist you?";

const DEFAULT_MODEL: &str = "agent";

const REGION_HEADER: &str = "x-agent-region";

const FINAL_RESPONSE_POINTER: &str = "/trace/orchestrationTrace/observation/finalResponse/text";

/// Adapter for the agent runtime's invoke endpoint
pub struct AgentProvider {
    client: reqwest::Client,
    runtime_url: Option<String>,
    agent_id: Option<String>,
    agent_alias_id: Option<String>,
    api_key: Option<String>,
    region: String,
}

/// Agent coordinates after routing overrides are applied
#[derive(Debug, PartialEq, Eq)]
struct AgentTarget<'a> {
    runtime_url: &'a str,
    agent_id: &'a str,
    agent_alias_id: &'a str,
    api_key: &'a str,
    region: &'a str,
}

impl AgentProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            runtime_url: config
                .agent_runtime_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            agent_id: config.agent_id.clone(),
            agent_alias_id: config.agent_alias_id.clone(),
            api_key: config.agent_api_key.clone(),
            region: config.agent_region.clone(),
        }
    }

    fn target<'a>(&'a self, call: &'a ProviderCall) -> Result<AgentTarget<'a>, ProviderError> {
        let missing = |what: &str| ProviderError::NotConfigured(format!("{} is not set", what));

        Ok(AgentTarget {
            runtime_url: self
                .runtime_url
                .as_deref()
                .ok_or_else(|| missing("AGENT_RUNTIME_URL"))?,
            agent_id: call
                .routing
                .agent_id
                .as_deref()
                .or(self.agent_id.as_deref())
                .ok_or_else(|| missing("AGENT_ID"))?,
            agent_alias_id: call
                .routing
                .agent_alias_id
                .as_deref()
                .or(self.agent_alias_id.as_deref())
                .ok_or_else(|| missing("AGENT_ALIAS_ID"))?,
            api_key: self
                .api_key
                .as_deref()
                .ok_or_else(|| missing("AGENT_API_KEY"))?,
            region: call.routing.region.as_deref().unwrap_or(&self.region),
        })
    }

    async fn invoke(&self, call: &ProviderCall) -> Result<reqwest::Response, ProviderError> {
        let input_text = call
            .conversation
            .last_user_message()
            .ok_or(ProviderError::NoUserMessage)?;
        let target = self.target(call)?;

        let url = format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            target.runtime_url, target.agent_id, target.agent_alias_id, call.session_handle
        );
        debug!(
            url = %url,
            region = %target.region,
            input_len = input_text.len(),
            "Invoking agent"
        );
        let body = json!({
            "inputText": input_text,
            "enableTrace": true,
        });
        log_request(self.name(), &url, &body);

        let response = self
            .client
            .post(&url)
            .bearer_auth(target.api_key)
            .header(REGION_HEADER, target.region)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for AgentProvider {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn display_name(&self) -> &'static str {
        "Agent"
    }

    fn default_model(&self) -> String {
        DEFAULT_MODEL.to_string()
    }

    fn is_available(&self) -> bool {
        self.runtime_url.is_some()
            && self.agent_id.is_some()
            && self.agent_alias_id.is_some()
            && self.api_key.is_some()
    }

    fn empty_reply(&self) -> &'static str {
        EMPTY_REPLY
    }

    #[instrument(skip(self, call), fields(session_handle = %call.session_handle))]
    async fn complete(&self, call: &ProviderCall) -> Result<Completion, ProviderError> {
        let response = self.invoke(call).await?;
        let body = response.bytes().await?;

        let events = decode_body(&body, &mut AgentEventDecoder::default());

        let mut content = String::new();
        for event in events {
            match event {
                ProviderEvent::TextDelta(text) => content.push_str(&text),
                ProviderEvent::Failed(message) => return Err(ProviderError::Stream(message)),
                ProviderEvent::RoleAnnounced | ProviderEvent::Completed(_) => {}
            }
        }

        info!(content_len = content.len(), "Agent reply received");
        log_reply(self.name(), &content);
        Ok(Completion {
            content,
            finish_reason: FinishReason::Stop,
        })
    }

    #[instrument(skip(self, call), fields(session_handle = %call.session_handle))]
    async fn stream(&self, call: &ProviderCall) -> Result<ProviderStream, ProviderError> {
        let response = self.invoke(call).await?;
        let events = decode_stream(
            response.bytes_stream(),
            AgentEventDecoder::default(),
            "Agent",
        );

        Ok(ProviderStream::new(events, Delivery::Whole))
    }
}

/// Maps agent runtime NDJSON events to provider events
///
/// Chunk text is emitted as it arrives. The orchestration trace's final
/// response is held back and only used when the agent produced no chunk text.
#[derive(Debug, Default)]
struct AgentEventDecoder {
    saw_text: bool,
    final_response: Option<String>,
    terminated: bool,
}

impl LineDecoder for AgentEventDecoder {
    fn decode_line(&mut self, line: &str) -> Vec<ProviderEvent> {
        if self.terminated {
            return Vec::new();
        }

        let event: Value = match serde_json::from_str(line) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) => {
                warn!("Skipping non-object agent event");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Skipping undecodable agent event");
                return Vec::new();
            }
        };

        if let Some(message) = exception_message(&event) {
            self.terminated = true;
            return vec![ProviderEvent::Failed(message)];
        }

        if let Some(trace) = event.get("trace") {
            if let Some(text) = trace.pointer(FINAL_RESPONSE_POINTER).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    self.final_response = Some(text.to_string());
                }
            }
            return Vec::new();
        }

        let text = if let Some(chunk) = event.get("chunk") {
            chunk.get("bytes").and_then(Value::as_str).map(chunk_text)
        } else {
            event
                .get("text")
                .or_else(|| event.get("content"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        match text.filter(|t| !t.trim().is_empty()) {
            Some(text) => {
                debug!(text = %text, "Decoded agent text");
                self.saw_text = true;
                vec![ProviderEvent::TextDelta(text)]
            }
            None => Vec::new(),
        }
    }

    /// The held-back final response if no chunk text arrived, then completion
    fn finish(&mut self) -> Vec<ProviderEvent> {
        if self.terminated {
            return Vec::new();
        }
        self.terminated = true;

        let mut events = Vec::new();
        if !self.saw_text {
            if let Some(text) = self.final_response.take() {
                events.push(ProviderEvent::TextDelta(text));
            }
        }
        events.push(ProviderEvent::Completed(FinishReason::Stop));
        events
    }
}

/// Chunk payloads are either plain text or a JSON object with a `content` string
fn chunk_text(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => match map.get("content").and_then(Value::as_str) {
            Some(content) => content.to_string(),
            None => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}

fn exception_message(event: &Value) -> Option<String> {
    let (key, body) = event
        .as_object()?
        .iter()
        .find(|(key, _)| key.ends_with("Exception"))?;

    Some(
        body.get("message")
            .and_then(Value::as_str)
            .map(|m| format!("{}: {}", key, m))
            .unwrap_or_else(|| key.clone()),
    )
}
