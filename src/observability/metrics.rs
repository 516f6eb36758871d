//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dapp_sync_refresh_total` (counter): snapshot refreshes by outcome
//! - `dapp_sync_read_failures_total` (counter): failed view calls by field
//! - `dapp_sync_writes_total` (counter): write actions by tag and outcome
//! - `dapp_sync_rpc_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("dapp_sync_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_read_failure(field: &'static str) {
    metrics::counter!("dapp_sync_read_failures_total", "field" => field).increment(1);
}

pub fn record_write(action: &'static str, outcome: &'static str) {
    metrics::counter!("dapp_sync_writes_total", "action" => action, "outcome" => outcome)
        .increment(1);
}

pub fn record_rpc_health(healthy: bool) {
    metrics::gauge!("dapp_sync_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}
