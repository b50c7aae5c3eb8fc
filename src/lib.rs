//! Switchboard - OpenAI-compatible chat completions gateway
//!
//! Accepts OpenAI chat completion requests, routes each one to a configured
//! provider (an OpenAI-compatible API or a conversational agent runtime), and
//! translates the provider's reply back into OpenAI's response and streaming
//! chunk formats.

pub mod config;
pub mod docs;
pub mod error;
pub mod providers;
pub mod routes;
pub mod session;
pub mod streaming;
#[cfg(test)]
pub(crate) mod testing;
pub mod translate;
pub mod wire;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::config::Config;
pub use crate::providers::{CompletionProvider, ProviderRegistry};
pub use crate::session::SessionRegistry;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Providers available to route requests to
    pub providers: Arc<ProviderRegistry>,
    /// Client sessions and their backend handles
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .build()?;

        let providers = Arc::new(ProviderRegistry::from_config(http_client, &config));
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl_seconds));

        Ok(Self {
            config,
            start_time: Instant::now(),
            providers,
            sessions,
        })
    }

    /// Create an application state around a prepared provider registry
    ///
    /// Tests use this to route requests to scripted providers or to adapters
    /// pointed at mock servers.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(config: Config, providers: ProviderRegistry) -> Self {
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl_seconds));

        Self {
            config,
            start_time: Instant::now(),
            providers: Arc::new(providers),
            sessions,
        }
    }
}
