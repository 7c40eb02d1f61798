//! Structured event stream for `phaseclock`.
//!
//! Discrete, typed events emitted while a schedule runs. Events are
//! serialized as newline-delimited JSON (JSONL) and include a monotonically
//! increasing sequence number for ordering.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::phase::PhaseTransition;

/// Why a schedule run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The total scheduled duration elapsed.
    Completed,
    /// Interrupted by SIGINT or SIGTERM.
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// A discrete event emitted during a schedule run.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The activity clock started.
    ScheduleStarted {
        /// When the clock started.
        timestamp: DateTime<Utc>,
        /// Configured schedule name.
        schedule_name: String,
        /// Number of phases in the schedule.
        phase_count: usize,
        /// Total scheduled duration in seconds.
        total_seconds: f64,
        /// Name of the initial phase.
        initial_phase: String,
    },

    /// A new phase has been entered.
    PhaseEntered {
        /// When the transition was observed.
        timestamp: DateTime<Utc>,
        /// Name of the phase that was entered.
        phase_name: String,
        /// Zero-based index of the phase.
        phase_index: usize,
        /// Index of the phase that was left.
        from_index: usize,
        /// Activity time at which the transition was observed.
        elapsed_seconds: f64,
    },

    /// One or more listeners failed while handling a transition.
    ListenerFailed {
        /// When the failures were observed.
        timestamp: DateTime<Utc>,
        /// Phase whose entry the listeners failed to handle.
        phase_name: String,
        /// Number of failing listeners.
        failures: usize,
    },

    /// The run ended.
    ScheduleFinished {
        /// When the run ended.
        timestamp: DateTime<Utc>,
        /// Why the run ended.
        reason: StopReason,
        /// Name of the phase active at the end.
        final_phase: String,
        /// Activity time at the end of the run.
        elapsed_seconds: f64,
        /// Number of transitions dispatched during the run.
        transitions: u64,
    },
}

impl Event {
    /// Builds the events describing a transition: a `PhaseEntered` event and,
    /// if any listener failed, a `ListenerFailed` event.
    #[must_use]
    pub fn from_transition(transition: &PhaseTransition) -> Vec<Self> {
        let timestamp = Utc::now();
        let mut events = vec![Self::PhaseEntered {
            timestamp,
            phase_name: transition.phase.name().to_owned(),
            phase_index: transition.to_phase,
            from_index: transition.from_phase,
            elapsed_seconds: transition.elapsed_seconds,
        }];
        if transition.listener_failures > 0 {
            events.push(Self::ListenerFailed {
                timestamp,
                phase_name: transition.phase.name().to_owned(),
                failures: transition.listener_failures,
            });
        }
        events
    }
}

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) increments the sequence counter,
/// serializes the event as a single JSON line, and flushes the underlying
/// writer. Serialization or I/O failures are dropped so event output can
/// never stop a run.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}
