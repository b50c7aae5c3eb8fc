//! Configuration management for Switchboard
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Provider used when a request does not name one
    pub default_provider: String,
    /// Idle TTL for session entries (in seconds)
    pub session_ttl_seconds: u64,
    /// Total timeout applied by the shared upstream HTTP client (in seconds)
    pub upstream_timeout_seconds: u64,

    /// OpenAI API URL
    pub openai_api_url: String,
    /// OpenAI API key (provider is unavailable without it)
    pub openai_api_key: Option<String>,
    /// Model used when the client does not name one
    pub openai_model: String,

    /// Base URL of the agent runtime endpoint
    pub agent_runtime_url: Option<String>,
    /// Agent identifier
    pub agent_id: Option<String>,
    /// Agent alias identifier
    pub agent_alias_id: Option<String>,
    /// Credential presented to the agent runtime
    pub agent_api_key: Option<String>,
    /// Region the agent is deployed in
    pub agent_region: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("GATEWAY_PORT")
                .unwrap_or_else(|_| "5005".to_string())
                .parse()
                .context("Invalid GATEWAY_PORT")?,

            default_provider: env::var("PROVIDER_NAME")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|_| "openai".to_string()),
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid SESSION_TTL_SECONDS")?,
            upstream_timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid UPSTREAM_TIMEOUT_SECONDS")?,

            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),

            agent_runtime_url: non_empty("AGENT_RUNTIME_URL"),
            agent_id: non_empty("AGENT_ID"),
            agent_alias_id: non_empty("AGENT_ALIAS_ID"),
            agent_api_key: non_empty("AGENT_API_KEY"),
            agent_region: non_empty("AGENT_REGION")
                .or_else(|| non_empty("AWS_REGION"))
                .unwrap_or_else(|| "us-east-1".to_string()),
        })
    }

    /// Configuration with both providers configured against local URLs
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            default_provider: "openai".to_string(),
            session_ttl_seconds: 3600,
            upstream_timeout_seconds: 30,
            openai_api_url: "http://127.0.0.1:9".to_string(),
            openai_api_key: Some("test-openai-api-key".to_string()),
            openai_model: "gpt-4o-mini".to_string(),
            agent_runtime_url: Some("http://127.0.0.1:9".to_string()),
            agent_id: Some("TESTAGENT".to_string()),
            agent_alias_id: Some("TESTALIAS".to_string()),
            agent_api_key: Some("test-agent-api-key".to_string()),
            agent_region: "us-east-1".to_string(),
        }
    }
}

/// Read an env var, treating an empty value as unset
fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
