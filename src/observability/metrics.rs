//! Metrics collection and exposition.
//!
//! # Metrics
//! - `broker_requests_total` (counter): proxied requests by method,
//!   status, route
//! - `broker_request_duration_seconds` (histogram): proxy latency
//! - `broker_ready` (gauge): 1 once the readiness gate is open
//! - `broker_probe_failures_total` (counter): failed readiness probes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "broker_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
    )
    .increment(1);
    histogram!(
        "broker_request_duration_seconds",
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the readiness gate opening or closing.
pub fn record_readiness(ready: bool) {
    gauge!("broker_ready").set(if ready { 1.0 } else { 0.0 });
}

/// Record one failed readiness probe.
pub fn record_probe_failure() {
    counter!("broker_probe_failures_total").increment(1);
}
