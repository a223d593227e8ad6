//! Metrics collection and exposition.
//!
//! # Metrics
//! - `topic_transactions_total` (counter): transactions by operation, status
//! - `topic_receipt_wait_seconds` (histogram): submit-to-receipt latency
//! - `topic_validation_failures_total` (counter): requests rejected locally
//! - `topic_messages_delivered_total` (counter): messages handed to subscribers
//! - `topic_active_subscriptions` (gauge): running subscriptions
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(operation: &'static str, status: &'static str) {
    counter!("topic_transactions_total", "operation" => operation, "status" => status).increment(1);
}

pub fn record_receipt_wait(operation: &'static str, elapsed: Duration) {
    histogram!("topic_receipt_wait_seconds", "operation" => operation).record(elapsed.as_secs_f64());
}

pub fn record_validation_failure(operation: &'static str) {
    counter!("topic_validation_failures_total", "operation" => operation).increment(1);
}

pub fn record_message_delivered() {
    counter!("topic_messages_delivered_total").increment(1);
}

pub fn record_subscription_started() {
    gauge!("topic_active_subscriptions").increment(1.0);
}

pub fn record_subscription_ended() {
    gauge!("topic_active_subscriptions").decrement(1.0);
}
