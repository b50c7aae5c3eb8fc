//! Completion provider abstraction layer
//!
//! Defines the trait every backend adapter implements so the rest of the
//! gateway can route a conversation without knowing which backend answers it.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never forward client Authorization headers to upstream backends
//! - Use backend credentials from configuration only
//! - Keep upstream error bodies out of client-facing messages (they surface
//!   through [`ProviderError`], which the HTTP layer sanitizes)

pub mod agent;
pub mod events;
pub mod openai;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::wire::{Conversation, FinishReason};

pub use agent::AgentProvider;
pub use events::{Delivery, EventStream, ProviderEvent, ProviderStream};
pub use openai::OpenAIProvider;
pub use registry::{ProviderInfo, ProviderListing, ProviderRegistry};

/// Header overriding the configured agent id
pub const AGENT_ID_HEADER: &str = "x-agent-id";
/// Header overriding the configured agent alias id
pub const AGENT_ALIAS_ID_HEADER: &str = "x-agent-alias-id";
/// Header overriding the configured agent region
pub const AGENT_REGION_HEADER: &str = "x-agent-region";

/// Errors raised by provider adapters
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream rejected the gateway credentials (status {0})")]
    Unauthorized(u16),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Upstream stream failed: {0}")]
    Stream(String),

    #[error("Conversation has no user message")]
    NoUserMessage,
}

impl ProviderError {
    /// Classify a non-success upstream status
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::Unauthorized(status),
            _ => ProviderError::Upstream { status, body },
        }
    }
}

/// Per-request routing hints taken from request headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingOverrides {
    pub agent_id: Option<String>,
    pub agent_alias_id: Option<String>,
    pub region: Option<String>,
}

impl RoutingOverrides {
    /// Read the `x-agent-*` headers; blank values are ignored
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            agent_id: read(AGENT_ID_HEADER),
            agent_alias_id: read(AGENT_ALIAS_ID_HEADER),
            region: read(AGENT_REGION_HEADER),
        }
    }
}

/// Everything an adapter needs for one call
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub conversation: Conversation,
    /// Model name to request (already defaulted by the caller)
    pub model: String,
    /// Backend-side session handle
    pub session_handle: String,
    pub routing: RoutingOverrides,
}

/// A complete (non-streamed) reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub finish_reason: FinishReason,
}

/// Trait implemented by every completion backend
///
/// Adapters translate a [`ProviderCall`] into the backend's native request
/// and its reply into either a [`Completion`] or a [`ProviderStream`] of
/// [`ProviderEvent`]s.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Registry name used in requests, logs and metrics
    fn name(&self) -> &'static str;

    /// Human-readable name for the provider listing
    fn display_name(&self) -> &'static str;

    /// Model reported when the client does not name one
    fn default_model(&self) -> String;

    /// Whether the provider has the configuration it needs
    fn is_available(&self) -> bool;

    /// Reply substituted when the backend finishes without any text
    fn empty_reply(&self) -> &'static str;

    /// Run the call and return the whole reply
    async fn complete(&self, call: &ProviderCall) -> Result<Completion, ProviderError>;

    /// Start the call and return its event stream
    ///
    /// Failures before the backend accepts the call are returned as `Err`;
    /// failures after that arrive in-band as [`ProviderEvent::Failed`].
    async fn stream(&self, call: &ProviderCall) -> Result<ProviderStream, ProviderError>;
}

/// Read a non-success response body for the error, tolerating a broken body
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::from_status(status, body)
}

/// Record an outgoing backend request body at debug level
pub(crate) fn log_request(provider: &str, url: &str, body: &Value) {
    debug!(provider, url, body = %body, "Provider request");
}

/// Record a backend's complete reply at debug level
pub(crate) fn log_reply(provider: &str, content: &str) {
    debug!(provider, content_len = content.len(), content, "Provider reply");
}
