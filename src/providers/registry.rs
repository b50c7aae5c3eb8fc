//! Provider registry
//!
//! A fixed set of adapters built at startup. Selection is a pure lookup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{AgentProvider, CompletionProvider, OpenAIProvider};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// One entry of the provider listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ProviderInfo {
    #[schema(example = "openai")]
    pub name: String,
    #[schema(example = "OpenAI")]
    pub display_name: String,
    pub available: bool,
    /// Null when the provider is unavailable
    #[schema(example = "gpt-4o-mini")]
    pub default_model: Option<String>,
}

/// Body of `GET /v1/providers`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ProviderListing {
    pub providers: Vec<ProviderInfo>,
    /// Provider used when a request does not name one
    #[schema(example = "openai")]
    pub default: String,
}

/// Registered providers plus the configured default
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn CompletionProvider>>,
    default: String,
}

impl ProviderRegistry {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            providers: Vec::new(),
            default: default.into().to_lowercase(),
        }
    }

    /// Build the registry with every built-in adapter
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(config.default_provider.clone())
            .register(Arc::new(OpenAIProvider::new(client.clone(), config)))
            .register(Arc::new(AgentProvider::new(client, config)))
    }

    pub fn register(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Case-insensitive lookup by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CompletionProvider>> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// The configured default, if it is registered and available
    pub fn default_provider(&self) -> Option<&Arc<dyn CompletionProvider>> {
        self.get(&self.default).filter(|p| p.is_available())
    }

    /// Pick the provider for a request
    ///
    /// An explicit name must be registered and available. Without one, the
    /// configured default is used.
    #[instrument(skip(self))]
    pub fn select(&self, requested: Option<&str>) -> AppResult<Arc<dyn CompletionProvider>> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());

        if let Some(name) = requested {
            let provider = self
                .get(name)
                .ok_or_else(|| AppError::UnknownProvider(name.to_string()))?;
            if !provider.is_available() {
                return Err(AppError::ProviderUnavailable(provider.name().to_string()));
            }
            debug!(provider = provider.name(), "Using requested provider");
            return Ok(provider.clone());
        }

        let provider = self
            .default_provider()
            .ok_or(AppError::NoProviderConfigured)?;
        debug!(provider = provider.name(), "Using default provider");
        Ok(provider.clone())
    }

    pub fn listing(&self) -> ProviderListing {
        ProviderListing {
            providers: self
                .providers
                .iter()
                .map(|p| {
                    let available = p.is_available();
                    ProviderInfo {
                        name: p.name().to_string(),
                        display_name: p.display_name().to_string(),
                        available,
                        default_model: available.then(|| p.default_model()),
                    }
                })
                .collect(),
            default: self.default.clone(),
        }
    }
}
