//! Response types for the chat completions endpoint
//!
//! Defines the single-response body and the streaming chunk, both serialized
//! field-for-field the way OpenAI does (nullable fields are emitted as `null`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{FinishReason, Role};

/// Usage counter value reported when token accounting is unavailable
pub const USAGE_UNAVAILABLE: i64 = -1;

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Usage {
    #[schema(example = -1)]
    pub prompt_tokens: i64,
    #[schema(example = -1)]
    pub completion_tokens: i64,
    #[schema(example = -1)]
    pub total_tokens: i64,
}

impl Usage {
    /// Usage block for backends that report no token counts
    pub fn unavailable() -> Self {
        Self {
            prompt_tokens: USAGE_UNAVAILABLE,
            completion_tokens: USAGE_UNAVAILABLE,
            total_tokens: USAGE_UNAVAILABLE,
        }
    }
}

/// Message in a completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChoiceMessage {
    /// Role of the message author (always assistant)
    pub role: Role,
    /// Content of the message
    #[schema(example = "Hi there")]
    pub content: String,
}

/// A completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Choice {
    #[schema(example = 0)]
    pub index: u32,
    pub message: ChoiceMessage,
    pub finish_reason: FinishReason,
}

/// Chat completion response (non-streaming)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ChatCompletionResponse {
    #[schema(example = "chatcmpl-2b1f6f9e-7a4c-4d0e-9d43-1b1c1f0e8a11")]
    pub id: String,
    /// Object type (always "chat.completion")
    #[schema(example = "chat.completion")]
    pub object: String,
    /// Unix timestamp of creation
    #[schema(example = 1677858242)]
    pub created: i64,
    #[schema(example = "gpt-4o-mini")]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, ToSchema)]
pub struct Delta {
    /// Role (only present in the first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Content fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = " there")]
    pub content: Option<String>,
}

impl Delta {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            content: None,
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self {
            role: None,
            content: Some(text.into()),
        }
    }
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StreamChoice {
    #[schema(example = 0)]
    pub index: u32,
    pub delta: Delta,
    /// Always null; log probabilities are not produced
    #[schema(value_type = Option<Object>)]
    pub logprobs: Option<serde_json::Value>,
    /// Null until the final chunk
    pub finish_reason: Option<FinishReason>,
}

/// Streaming chunk for chat completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StreamChunk {
    pub id: String,
    /// Object type (always "chat.completion.chunk")
    #[schema(example = "chat.completion.chunk")]
    pub object: String,
    pub created: i64,
    pub model: String,
    /// Always null
    pub system_fingerprint: Option<String>,
    pub choices: Vec<StreamChoice>,
}
