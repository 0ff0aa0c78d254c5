//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): outcomes by service, outcome
//! - `gateway_request_duration_seconds` (histogram): upstream latency
//! - `gateway_redirects_total` (counter): redirection attempts by service
//! - `gateway_fallbacks_total` (counter): fallback dispatches by strategy
//! - `gateway_instance_health` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_failure_risk` (gauge): latest predicted risk per service
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter owns its own HTTP listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(service: &str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_redirect(service: &str) {
    metrics::counter!("gateway_redirects_total", "service" => service.to_string()).increment(1);
}

pub fn record_fallback(service: &str, strategy: &'static str) {
    metrics::counter!(
        "gateway_fallbacks_total",
        "service" => service.to_string(),
        "strategy" => strategy
    )
    .increment(1);
}

pub fn record_instance_health(instance: &str, healthy: bool) {
    metrics::gauge!("gateway_instance_health", "instance" => instance.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_failure_risk(service: &str, risk: f64) {
    metrics::gauge!("gateway_failure_risk", "service" => service.to_string()).set(risk);
}
