//! Metrics definitions for the Space Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sc_` prefix for Space Controller
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `scope` on failure counters: 3 values (list_rooms, space, deadline)
//!
//! Space and participant names are never used as labels.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Count a reconciliation sweep.
///
/// Metric: `sc_reconciler_sweeps_total`
pub fn incr_reconciler_sweeps() {
    counter!("sc_reconciler_sweeps_total").increment(1);
}

/// Count a reconciliation failure.
///
/// Metric: `sc_reconciler_failures_total`
/// Labels: `scope` (list_rooms, space, deadline)
pub fn incr_reconciler_failures(scope: &'static str) {
    counter!("sc_reconciler_failures_total", "scope" => scope).increment(1);
}

/// Count a stale participant removed by reconciliation.
///
/// Metric: `sc_reconciler_removals_total`
pub fn incr_reconciler_removals() {
    counter!("sc_reconciler_removals_total").increment(1);
}

/// Count a re-init signal emitted by reconciliation.
///
/// Metric: `sc_reconciler_reinits_total`
pub fn incr_reconciler_reinits() {
    counter!("sc_reconciler_reinits_total").increment(1);
}

/// Set the number of live spaces, sampled by the request path on listing.
///
/// Metric: `sc_spaces_live`
pub fn set_spaces_live(count: usize) {
    // usize to f64 conversion is safe for realistic space counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("sc_spaces_live").set(count as f64);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic_without_recorder() {
        // The metrics crate no-ops when no recorder is installed
        incr_reconciler_sweeps();
        incr_reconciler_failures("space");
        incr_reconciler_removals();
        incr_reconciler_reinits();
        set_spaces_live(3);
    }
}
