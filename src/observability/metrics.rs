//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_security_rejections_total` (counter): 403s by check
//! - `gateway_csrf_tokens_issued_total` (counter)
//! - `gateway_csrf_validations_total` (counter): by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so library code
//!   and tests can call these freely

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_security_rejection(check: &'static str) {
    counter!("gateway_security_rejections_total", "check" => check).increment(1);
}

pub fn record_csrf_issued() {
    counter!("gateway_csrf_tokens_issued_total").increment(1);
}

pub fn record_csrf_validation(outcome: &'static str) {
    counter!("gateway_csrf_validations_total", "outcome" => outcome).increment(1);
}
