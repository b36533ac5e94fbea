//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cdn_reports_total` (counter): reported outcomes by `outcome` (success, failure, untracked)
//! - `cdn_report_delay_ms` (histogram): delays of successful attempts
//! - `cdn_selections_total` (counter): selections by `result` (ok, unavailable)
//! - `cdn_snapshots_saved_total` (counter): snapshots written
//! - `cdn_snapshot_entries` (gauge): entries in the last snapshot
//! - `cdn_pool_size` (gauge): hosts tracked
//! - `cdn_top_weight` (gauge): weight of the rank 0 endpoint
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_report(success: bool, delay_ms: u64) {
    let outcome = if success { "success" } else { "failure" };
    counter!("cdn_reports_total", "outcome" => outcome).increment(1);
    if success {
        histogram!("cdn_report_delay_ms").record(delay_ms as f64);
    }
}

pub fn record_report_rejected() {
    counter!("cdn_reports_total", "outcome" => "untracked").increment(1);
}

pub fn record_selection(ok: bool) {
    let result = if ok { "ok" } else { "unavailable" };
    counter!("cdn_selections_total", "result" => result).increment(1);
}

pub fn record_snapshot_saved(entries: usize) {
    counter!("cdn_snapshots_saved_total").increment(1);
    gauge!("cdn_snapshot_entries").set(entries as f64);
}

pub fn record_pool_size(size: usize) {
    gauge!("cdn_pool_size").set(size as f64);
}

pub fn record_top_weight(weight: f64) {
    gauge!("cdn_top_weight").set(weight);
}
