//! # Hub Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `hub_connections` - Gauge of registered connections
//! - `hub_deliveries_total` - Counter of payloads accepted by a connection buffer
//! - `hub_dropped_connections_total` - Counter of connections dropped on full or closed buffers
//! - `hub_encode_failures_total` - Counter of notifications the pump could not encode
//! - `hub_pump_running` - Gauge, 1 while a change-feed pump is attached

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref CONNECTIONS: IntGauge = register_int_gauge!(
        "hub_connections",
        "Number of registered connections"
    )
    .expect("Failed to create CONNECTIONS metric");

    pub static ref DELIVERIES: IntCounter = register_int_counter!(
        "hub_deliveries_total",
        "Total payloads accepted by a connection buffer"
    )
    .expect("Failed to create DELIVERIES metric");

    pub static ref DROPPED: IntCounter = register_int_counter!(
        "hub_dropped_connections_total",
        "Total connections dropped on full or closed buffers"
    )
    .expect("Failed to create DROPPED metric");

    pub static ref ENCODE_FAILURES: IntCounter = register_int_counter!(
        "hub_encode_failures_total",
        "Total notifications the pump could not encode"
    )
    .expect("Failed to create ENCODE_FAILURES metric");

    pub static ref PUMP_RUNNING: IntGauge = register_int_gauge!(
        "hub_pump_running",
        "Whether a change-feed pump is attached (0=no, 1=yes)"
    )
    .expect("Failed to create PUMP_RUNNING metric");
}

#[cfg(feature = "metrics")]
pub fn inc_connections() {
    CONNECTIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn dec_connections(count: usize) {
    CONNECTIONS.sub(count as i64);
}

#[cfg(feature = "metrics")]
pub fn record_delivery(delivered: usize, dropped: usize) {
    DELIVERIES.inc_by(delivered as u64);
    DROPPED.inc_by(dropped as u64);
    CONNECTIONS.sub(dropped as i64);
}

#[cfg(feature = "metrics")]
pub fn record_encode_failure() {
    ENCODE_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn set_pump_running(running: bool) {
    PUMP_RUNNING.set(i64::from(running));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn dec_connections(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_delivery(_delivered: usize, _dropped: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_encode_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn set_pump_running(_running: bool) {}
