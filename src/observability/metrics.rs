//! Metrics collection for `phaseclock`.
//!
//! Prometheus-compatible counters and gauges for phase transitions and
//! listener failures. Every recording function is a no-op until
//! [`init_metrics`] installs a recorder.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::PhaseClockError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Maximum length for phase name labels.
///
/// Phase names come from user config and are used directly as Prometheus
/// labels.
const MAX_PHASE_LABEL_LEN: usize = 64;

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `PhaseClockError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), PhaseClockError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| PhaseClockError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "phaseclock_phase_transitions_total",
        "Total number of dispatched phase transitions"
    );
    describe_gauge!(
        "phaseclock_current_phase_index",
        "Index of the currently active phase"
    );
    describe_counter!(
        "phaseclock_listener_failures_total",
        "Total number of listener callbacks that returned an error"
    );
}

/// Records a dispatched transition into `phase` at position `index`.
pub fn record_transition(phase: &str, index: usize) {
    counter!(
        "phaseclock_phase_transitions_total",
        "phase" => sanitize_phase_label(phase)
    )
    .increment(1);
    record_phase_index(index);
}

/// Sets the current phase index gauge.
#[allow(clippy::cast_precision_loss)]
pub fn record_phase_index(index: usize) {
    gauge!("phaseclock_current_phase_index").set(index as f64);
}

/// Records a listener failure while entering `phase`.
pub fn record_listener_failure(phase: &str) {
    counter!(
        "phaseclock_listener_failures_total",
        "phase" => sanitize_phase_label(phase)
    )
    .increment(1);
}

/// Sanitizes a phase name for use as a metrics label.
///
/// Truncates to [`MAX_PHASE_LABEL_LEN`] characters and replaces any
/// characters invalid in Prometheus labels with underscores.
fn sanitize_phase_label(name: &str) -> String {
    name.chars()
        .take(MAX_PHASE_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
