//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with provider status
//! - `/health/ready` - Readiness probe (default provider available)
//! - `/health/live` - Liveness probe

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Per-provider configuration check
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderCheck {
    pub status: HealthStatus,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Application statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStats {
    pub uptime_seconds: u64,
    pub active_sessions: usize,
}

/// Full health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub default_provider: String,
    pub checks: BTreeMap<String, ProviderCheck>,
    pub stats: HealthStats,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

fn provider_checks(state: &AppState) -> BTreeMap<String, ProviderCheck> {
    state
        .providers
        .listing()
        .providers
        .into_iter()
        .map(|info| {
            let check = ProviderCheck {
                status: if info.available {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Unhealthy
                },
                available: info.available,
                error: (!info.available).then(|| "missing configuration".to_string()),
            };
            (info.name, check)
        })
        .collect()
}

impl HealthStatus {
    /// Status of the gateway as a whole
    ///
    /// Healthy when the default provider is available, degraded when only other
    /// providers are, unhealthy when none is.
    fn overall(default_available: bool, checks: &BTreeMap<String, ProviderCheck>) -> Self {
        if default_available {
            HealthStatus::Healthy
        } else if checks.values().any(|c| c.available) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Full health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Gateway can serve requests", body = HealthResponse),
        (status = 503, description = "No provider is available", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let checks = provider_checks(&state);
    let status = HealthStatus::overall(state.providers.default_provider().is_some(), &checks);
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let response = HealthResponse {
        status: status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        timestamp: chrono::Utc::now().to_rfc3339(),
        default_provider: state.providers.default_name().to_string(),
        checks,
        stats: HealthStats {
            uptime_seconds,
            active_sessions: state.sessions.len(),
        },
    };

    (status.status_code(), Json(response))
}

/// Readiness probe: the default provider can take requests
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready", body = SimpleHealthResponse),
        (status = 503, description = "Default provider unavailable", body = SimpleHealthResponse)
    )
)]
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let status = match state.providers.default_provider() {
        Some(_) => HealthStatus::Healthy,
        None => HealthStatus::Unhealthy,
    };
    (status.status_code(), Json(SimpleHealthResponse { status }))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Alive", body = SimpleHealthResponse))
)]
pub async fn liveness_check() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse {
        status: HealthStatus::Healthy,
    })
}
