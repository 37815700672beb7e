//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_connections_total` (counter): accepted realtime sessions
//! - `gateway_auth_failures_total` (counter): refused handshakes by reason
//! - `gateway_broadcasts_total` (counter): broadcasts by event name
//! - `gateway_online_sessions` (gauge): current registry size
//! - `gateway_maintenance` (gauge): 1 once draining
//!
//! # Design Decisions
//! - One process-wide Prometheus recorder, rendered on `/metrics`
//! - Updates go through the `metrics` facade and are no-ops until installed

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder once and return its render handle.
pub fn install_recorder() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe();
                Some(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install metrics recorder");
                None
            }
        })
        .clone()
}

fn describe() {
    ::metrics::describe_counter!("gateway_connections_total", "Accepted realtime sessions");
    ::metrics::describe_counter!("gateway_auth_failures_total", "Refused realtime handshakes");
    ::metrics::describe_counter!("gateway_broadcasts_total", "Broadcast fan-outs");
    ::metrics::describe_gauge!("gateway_online_sessions", "Registered realtime sessions");
    ::metrics::describe_gauge!("gateway_maintenance", "1 while the gateway is draining");
}

pub fn record_connection() {
    ::metrics::counter!("gateway_connections_total").increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    ::metrics::counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}

pub fn record_broadcast(event: &str) {
    ::metrics::counter!("gateway_broadcasts_total", "event" => event.to_string()).increment(1);
}

pub fn set_online_sessions(count: usize) {
    ::metrics::gauge!("gateway_online_sessions").set(count as f64);
}
