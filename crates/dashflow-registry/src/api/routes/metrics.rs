//! Prometheus Metrics Endpoint
//!
//! Exposes Prometheus-format metrics at `/metrics` for scraping by Prometheus.
//!
//! # Metrics Exposed
//!
//! - HTTP request counts and latencies
//! - Cache hit/miss rates
//! - Storage operation metrics
//! - Search query metrics
//! - API key verification metrics
//! - Rate limiting events
//!
//! # Usage
//!
//! ```bash
//! curl http://localhost:3030/metrics
//! ```

#[cfg(feature = "metrics")]
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};

use crate::api::state::AppState;

/// Metrics routes (at root level)
#[cfg(feature = "metrics")]
pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(prometheus_metrics))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text format for scraping.
#[cfg(feature = "metrics")]
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(metrics) => match metrics.encode() {
            Ok(output) => (
                StatusCode::OK,
                [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
                output,
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("Content-Type", "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {}", e),
            ),
        },
        None => (
            StatusCode::NOT_FOUND,
            [("Content-Type", "text/plain; charset=utf-8")],
            "Metrics not enabled".to_string(),
        ),
    }
}

/// No-op metrics routes when feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn metrics_routes() -> axum::Router<AppState> {
    use axum::{http::StatusCode, routing::get, Router};

    Router::new().route(
        "/metrics",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                "Metrics feature not enabled. Rebuild with --features metrics",
            )
        }),
    )
}
