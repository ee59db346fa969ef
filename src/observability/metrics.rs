//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_check_status` (gauge): 0=healthy .. 3=unhealthy, by check
//! - `health_check_refresh_total` (counter): background refreshes, by check, outcome
//! - `health_check_refresh_skipped_total` (counter): ticks skipped while busy
//! - `health_check_errors_suppressed_total` (counter): failures hidden by debounce

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::health::Status;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(
            address = %addr,
            error = %e,
            "Failed to install metrics exporter"
        ),
    }
}

pub fn record_check_status(check: &str, status: Status) {
    metrics::gauge!("health_check_status", "check" => check.to_string())
        .set(f64::from(status.severity()));
}

pub fn record_refresh(check: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "health_check_refresh_total",
        "check" => check.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_refresh_skipped(check: &str) {
    metrics::counter!("health_check_refresh_skipped_total", "check" => check.to_string())
        .increment(1);
}

pub fn record_suppressed_error(check: &str) {
    metrics::counter!("health_check_errors_suppressed_total", "check" => check.to_string())
        .increment(1);
}
