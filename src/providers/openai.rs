//! OpenAI chat completions adapter
//!
//! Sends the full conversation to `{OPENAI_API_URL}/chat/completions` and maps
//! the upstream SSE stream onto [`ProviderEvent`]s.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::{
    error_from_response, log_reply, log_request, Completion, CompletionProvider, Delivery,
    ProviderCall, ProviderError, ProviderEvent, ProviderStream,
};
use crate::config::Config;
use crate::streaming::{decode_stream, sse_data, LineDecoder, DONE_MARKER};
use crate::wire::FinishReason;

const EMPTY_REPLY: &str = "I apologize, but I received no response. How else can I assist you?";

/// Adapter for OpenAI-compatible chat completion APIs
pub struct OpenAIProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    default_model: String,
}

impl OpenAIProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.openai_api_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            default_model: config.openai_model.clone(),
        }
    }

    fn request_body(call: &ProviderCall, stream: bool) -> Value {
        json!({
            "model": call.model,
            "messages": call.conversation.messages(),
            "stream": stream,
            "user": call.session_handle,
        })
    }

    async fn send(&self, call: &ProviderCall, stream: bool) -> Result<reqwest::Response, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, messages = call.conversation.len(), stream, "Sending request to OpenAI");
        let body = Self::request_body(call, stream);
        log_request(self.name(), &url, &body);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
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
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn empty_reply(&self) -> &'static str {
        EMPTY_REPLY
    }

    #[instrument(skip(self, call), fields(model = %call.model))]
    async fn complete(&self, call: &ProviderCall) -> Result<Completion, ProviderError> {
        let response = self.send(call, false).await?;
        let body: CompletionBody = serde_json::from_slice(&response.bytes().await?)?;

        let choice = body.choices.into_iter().next();
        let finish_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(FinishReason::from_upstream)
            .unwrap_or(FinishReason::Stop);
        let content = choice.and_then(|c| c.message.content).unwrap_or_default();

        info!(content_len = content.len(), "OpenAI completion received");
        log_reply(self.name(), &content);
        Ok(Completion {
            content,
            finish_reason,
        })
    }

    #[instrument(skip(self, call), fields(model = %call.model))]
    async fn stream(&self, call: &ProviderCall) -> Result<ProviderStream, ProviderError> {
        let response = self.send(call, true).await?;
        let events = decode_stream(response.bytes_stream(), ChunkDecoder::default(), "OpenAI");

        Ok(ProviderStream::new(events, Delivery::Incremental))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamFrameChoice>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StreamFrameChoice {
    #[serde(default)]
    delta: StreamFrameDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamFrameDelta {
    role: Option<String>,
    content: Option<String>,
}

/// Maps upstream SSE lines to provider events
#[derive(Debug, Default)]
struct ChunkDecoder {
    terminated: bool,
}

impl LineDecoder for ChunkDecoder {
    fn decode_line(&mut self, line: &str) -> Vec<ProviderEvent> {
        if self.terminated {
            return Vec::new();
        }
        // Comments, event names and ids carry nothing for us
        let Some(data) = sse_data(line) else {
            return Vec::new();
        };

        if data == DONE_MARKER {
            self.terminated = true;
            return vec![ProviderEvent::Completed(FinishReason::Stop)];
        }

        let frame: StreamFrame = match serde_json::from_str(data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable OpenAI stream frame");
                return Vec::new();
            }
        };

        if let Some(error) = frame.error {
            self.terminated = true;
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return vec![ProviderEvent::Failed(message)];
        }

        let mut events = Vec::new();
        if let Some(choice) = frame.choices.into_iter().next() {
            if choice.delta.role.is_some() {
                events.push(ProviderEvent::RoleAnnounced);
            }
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                debug!(text = %content, "Decoded OpenAI delta");
                events.push(ProviderEvent::TextDelta(content));
            }
            if let Some(reason) = choice.finish_reason {
                self.terminated = true;
                events.push(ProviderEvent::Completed(FinishReason::from_upstream(&reason)));
            }
        }
        events
    }

    fn finish(&mut self) -> Vec<ProviderEvent> {
        if self.terminated {
            return Vec::new();
        }
        // Upstream closed without [DONE]; the reply so far is complete
        self.terminated = true;
        vec![ProviderEvent::Completed(FinishReason::Stop)]
    }
}
