//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_exchanges_total` (counter): finished exchanges by outcome
//! - `bridge_exchange_duration_seconds` (histogram): exchange wall time
//! - `bridge_chunks_published_total` (counter): response chunks published
//! - `bridge_bytes_received_total` (counter): bytes read from backends
//! - `bridge_active_exchanges` (gauge): exchanges currently running
//! - `bridge_messages_dropped_total` (counter): inbound messages not dispatched, by reason
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_exchange(outcome: &'static str, elapsed: Duration) {
    counter!("bridge_exchanges_total", "outcome" => outcome).increment(1);
    histogram!("bridge_exchange_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_chunk_published(len: usize) {
    counter!("bridge_chunks_published_total").increment(1);
    counter!("bridge_bytes_received_total").increment(len as u64);
}

pub fn set_active_exchanges(active: u64) {
    gauge!("bridge_active_exchanges").set(active as f64);
}

pub fn record_dropped(reason: &'static str) {
    counter!("bridge_messages_dropped_total", "reason" => reason).increment(1);
}
