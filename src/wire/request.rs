//! Request types for the chat completions endpoint
//!
//! OpenAI clients send many optional sampling fields; the ones the gateway does not
//! act on are accepted and ignored.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{Content, Conversation, Message, Role};

/// A message as sent by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct InboundMessage {
    /// The role of the message author
    pub role: Role,
    /// The content of the message
    pub content: Content,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChatCompletionRequest {
    /// Model name echoed in responses; the provider default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "gpt-4o-mini")]
    pub model: Option<String>,
    /// Messages in the conversation
    pub messages: Vec<InboundMessage>,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
    /// Session to continue; a new one is allocated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Provider to route to; the configured default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "agent")]
    pub provider: Option<String>,
}

impl ChatCompletionRequest {
    /// Validate the messages and normalize them into a conversation.
    ///
    /// Rejects an empty message list and a conversation without any user turn.
    pub fn conversation(&self) -> Result<Conversation, String> {
        if self.messages.is_empty() {
            return Err("messages must not be empty".to_string());
        }
        if !self.messages.iter().any(|m| m.role == Role::User) {
            return Err("No user message found".to_string());
        }

        Ok(Conversation::new(
            self.messages
                .iter()
                .map(|m| Message::new(m.role, m.content.as_text()))
                .collect(),
        ))
    }

    /// Requested model, ignoring blank values
    pub fn requested_model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Requested session id, ignoring blank values
    pub fn requested_session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.trim().is_empty())
    }
}
