//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sso_snapshots_total` (counter): snapshot construction attempts by outcome
//! - `sso_snapshot_form_fields` (histogram): number of form fields per accepted snapshot
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed, so library users pay nothing
//! - Prometheus exporter runs its own listener, separate from the main server

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a successfully built snapshot.
pub fn record_snapshot(form_fields: usize) {
    counter!("sso_snapshots_total", "outcome" => "accepted").increment(1);
    histogram!("sso_snapshot_form_fields").record(form_fields as f64);
}

/// Record a rejected request, labelled with the rejection kind.
pub fn record_rejection(kind: &'static str) {
    counter!("sso_snapshots_total", "outcome" => kind).increment(1);
}
