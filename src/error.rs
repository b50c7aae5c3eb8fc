//! Error types for Switchboard
//!
//! Every error that reaches a client is rendered in OpenAI's error shape:
//! `{"error": {"message", "type", "code"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::providers::ProviderError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No provider is configured or available")]
    NoProviderConfigured,

    #[error("Provider {0} is not available (missing credentials?)")]
    ProviderUnavailable(String),

    #[error("Provider {provider} failed: {source}")]
    Backend {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap an adapter failure
    pub fn backend(provider: &str, source: ProviderError) -> Self {
        AppError::Backend {
            provider: provider.to_string(),
            source,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, &'static str, String) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_request",
                msg.clone(),
            ),
            AppError::UnknownProvider(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "unknown_provider",
                self.to_string(),
            ),
            AppError::NoProviderConfigured => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "no_provider_configured",
                self.to_string(),
            ),
            AppError::ProviderUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "provider_unavailable",
                self.to_string(),
            ),
            // Backend text can carry internal identifiers, so clients only get a generic message
            AppError::Backend { provider, .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "provider_error",
                format!("The {} provider failed to complete the request", provider),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
                "Internal server error".to_string(),
            ),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message
    #[schema(example = "messages must contain at least one user message")]
    pub message: String,
    /// Error type category
    #[serde(rename = "type")]
    #[schema(example = "invalid_request_error")]
    pub error_type: String,
    /// Error code for programmatic handling
    #[schema(example = "invalid_request")]
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = self.parts();

        match &self {
            AppError::Backend { provider, source } => {
                error!(provider = %provider, error = %source, "Provider call failed");
            }
            AppError::Internal(e) => {
                error!(error = ?e, "Internal error");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: ErrorBody {
                message,
                error_type: error_type.to_string(),
                code: code.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
