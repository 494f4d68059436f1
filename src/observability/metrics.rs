//! Metrics collection and exposition.
//!
//! # Metrics
//! - `front_requests_total` (counter): requests by status and action
//! - `front_request_duration_seconds` (histogram): end-to-end latency
//! - `front_action_failures_total` (counter): failed actions by identifier
//! - `front_fragments_rendered_total` (counter): fragments stored
//!
//! # Design Decisions
//! - Recorders go through the `metrics` facade; with no exporter installed
//!   they cost next to nothing
//! - Action identifiers are bounded by configuration, so they are safe labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(status: u16, action: &str, start: Instant) {
    metrics::counter!(
        "front_requests_total",
        "status" => status.to_string(),
        "action" => action.to_string()
    )
    .increment(1);
    metrics::histogram!("front_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_action_failure(action: &str) {
    metrics::counter!("front_action_failures_total", "action" => action.to_string()).increment(1);
}

pub fn record_fragments_rendered(count: usize) {
    metrics::counter!("front_fragments_rendered_total").increment(count as u64);
}
