//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_module_transitions_total` (counter): module, phase, outcome
//! - `lifecycle_phase_duration_seconds` (histogram): phase
//! - `table_updates_total` (counter): table, outcome
//! - `iss_requests_total` (counter): outcome
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_module_transition(module: &str, phase: &'static str, ok: bool) {
    counter!(
        "lifecycle_module_transitions_total",
        "module" => module.to_string(),
        "phase" => phase,
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_phase_duration(phase: &'static str, started: Instant) {
    histogram!("lifecycle_phase_duration_seconds", "phase" => phase)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_table_update(table: &str, outcome: &'static str) {
    counter!("table_updates_total", "table" => table.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_iss_request(outcome: &'static str) {
    counter!("iss_requests_total", "outcome" => outcome).increment(1);
}
