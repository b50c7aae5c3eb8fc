//! Switchboard - OpenAI-compatible chat completions gateway
//!
//! Binary entry point: loads configuration, builds the provider registry and
//! serves the router until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use switchboard::{routes, AppState, Config};

const DEFAULT_LOG_FILTER: &str = "switchboard=info,tower_http=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    info!(
        default_provider = %config.default_provider,
        session_ttl_seconds = config.session_ttl_seconds,
        "Starting Switchboard gateway"
    );

    routes::metrics::init_metrics();

    let state = Arc::new(AppState::new(config.clone())?);
    log_providers(&state, &config);

    let eviction = state.sessions.spawn_eviction_task();

    let app = routes::create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid GATEWAY_HOST/GATEWAY_PORT")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = eviction {
        task.abort();
    }
    info!("Switchboard shutdown complete");
    Ok(())
}

fn log_providers(state: &AppState, config: &Config) {
    for provider in state.providers.listing().providers {
        info!(
            provider = %provider.name,
            available = provider.available,
            default_model = ?provider.default_model,
            "Provider registered"
        );
    }
    if state.providers.default_provider().is_none() {
        warn!(
            default = %config.default_provider,
            "Default provider is not available; requests must name a provider"
        );
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, draining connections"),
        _ = terminate => warn!("Received SIGTERM, draining connections"),
    }
}
