//! Prometheus metrics endpoint
//!
//! Exposes gateway metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "switchboard_requests_total",
        "Chat completion requests by provider, mode and outcome"
    );
    metrics::describe_counter!(
        "switchboard_stream_chunks_total",
        "Content chunks written to streaming responses"
    );
    metrics::describe_counter!(
        "switchboard_stream_terminations_total",
        "Streaming responses by how they ended"
    );
    metrics::describe_histogram!(
        "switchboard_request_duration_seconds",
        "Time until the response (or the first streamed frame) was ready"
    );
    metrics::describe_gauge!(
        "switchboard_active_sessions",
        "Sessions currently held by the registry"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a chat completion request
pub fn record_request(provider: &str, stream: bool, status: &str, duration_secs: f64) {
    metrics::counter!(
        "switchboard_requests_total",
        "provider" => provider.to_string(),
        "stream" => stream.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("switchboard_request_duration_seconds", "provider" => provider.to_string())
        .record(duration_secs);
}

/// Record content chunks written to a stream
pub fn record_stream_chunks(provider: &str, count: u64) {
    metrics::counter!("switchboard_stream_chunks_total", "provider" => provider.to_string())
        .increment(count);
}

/// Record how a stream ended (`completed`, `failed`, `truncated`, `client_disconnect`)
pub fn record_stream_termination(provider: &str, outcome: &str) {
    metrics::counter!(
        "switchboard_stream_terminations_total",
        "provider" => provider.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Update active sessions gauge
pub fn set_active_sessions(count: usize) {
    metrics::gauge!("switchboard_active_sessions").set(count as f64);
}
