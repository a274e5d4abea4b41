//! Metrics collection and exposition.
//!
//! # Metrics
//! - `probe_attempts_total` (counter): connection attempts by transport and outcome
//! - `service_terminations_total` (counter): shutdowns by trigger (SIGINT, SIGTERM, close)
//! - `service_runs_total` (counter): completed serve calls by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are static strings only

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one probe attempt.
pub fn record_probe_attempt(transport: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("probe_attempts_total", "transport" => transport, "outcome" => outcome)
        .increment(1);
}

/// Record what triggered a coordinator's shutdown.
pub fn record_termination(trigger: &'static str) {
    metrics::counter!("service_terminations_total", "signal" => trigger).increment(1);
}

/// Record how a serve call ended.
pub fn record_run(outcome: &'static str) {
    metrics::counter!("service_runs_total", "outcome" => outcome).increment(1);
}
