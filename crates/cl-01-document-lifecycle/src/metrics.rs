//! # Lifecycle Metrics
//!
//! Prometheus metrics for document and contract transitions.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cl-01-document-lifecycle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `lifecycle_transitions_total` - Counter of committed transitions (by aggregate, event)
//! - `lifecycle_conflicts_total` - Counter of compare-and-swap conflicts
//! - `lifecycle_sweep_failures_total` - Counter of items skipped by a sweep (by pass)
//! - `lifecycle_notify_failures_total` - Counter of notification batches that failed to insert

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Committed transitions, labeled by aggregate and event
    pub static ref TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "lifecycle_transitions_total",
        "Total number of committed lifecycle transitions",
        &["aggregate", "event"]
    )
    .expect("Failed to create TRANSITIONS metric");

    /// Compare-and-swap conflicts
    pub static ref CONFLICTS: IntCounter = register_int_counter!(
        "lifecycle_conflicts_total",
        "Total number of compare-and-swap conflicts"
    )
    .expect("Failed to create CONFLICTS metric");

    /// Items skipped during a sweep, labeled by pass
    pub static ref SWEEP_FAILURES: IntCounterVec = register_int_counter_vec!(
        "lifecycle_sweep_failures_total",
        "Total number of items skipped by a sweep",
        &["pass"]
    )
    .expect("Failed to create SWEEP_FAILURES metric");

    /// Notification batches that failed to insert
    pub static ref NOTIFY_FAILURES: IntCounter = register_int_counter!(
        "lifecycle_notify_failures_total",
        "Total number of notification batches that failed to insert"
    )
    .expect("Failed to create NOTIFY_FAILURES metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_transition(aggregate: &str, event: &str) {
    TRANSITIONS.with_label_values(&[aggregate, event]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_conflict() {
    CONFLICTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_sweep_failure(pass: &str) {
    SWEEP_FAILURES.with_label_values(&[pass]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_notify_failure() {
    NOTIFY_FAILURES.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_transition(_aggregate: &str, _event: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_conflict() {}

#[cfg(not(feature = "metrics"))]
pub fn record_sweep_failure(_pass: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_notify_failure() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        record_transition("document", "signed");
        record_conflict();
        record_sweep_failure("expiry");
        record_notify_failure();
    }
}
