//! Phase scheduler
//!
//! The [`PhaseScheduler`] resolves which phase of a timed activity is active
//! by comparing the clock's elapsed time against the accumulated phase
//! boundaries. The host calls [`poll`](PhaseScheduler::poll) once per control
//! loop tick; listeners are notified once per forward transition.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ListenerError, ScheduleError};
use crate::observability::metrics;

use super::activity::{ActivityFlag, ActivityMonitor};
use super::clock::{Clock, MonotonicTime, TimeSource};
use super::definition::{Phase, TimeUnit};
use super::listener::{DiagnosticSink, ListenerId, ListenerRegistry, PhaseListener, TracingSink};

/// Record of a forward phase transition, returned by
/// [`PhaseScheduler::poll`].
#[derive(Debug, Clone)]
pub struct PhaseTransition {
    /// Phase index we transitioned from
    pub from_phase: usize,
    /// Phase index we transitioned to
    pub to_phase: usize,
    /// The phase that was entered
    pub phase: Phase,
    /// Clock reading at the poll that detected the transition
    pub elapsed_seconds: f64,
    /// Number of listeners that reported an error
    pub listener_failures: usize,
}

/// Start and end offsets of a phase within the activity.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseWindow {
    /// Position in the schedule
    pub index: usize,
    /// Phase name
    pub name: String,
    /// Offset in seconds at which the phase begins
    pub start_seconds: f64,
    /// Offset in seconds at which the phase ends
    pub end_seconds: f64,
}

/// Time-driven phase state machine for one timed activity.
///
/// Invariants:
/// - the phase list is never empty
/// - `current_index` never decreases and never exceeds `phases.len() - 1`
/// - once the last phase is reached it is reported until the scheduler is
///   dropped (terminal clamp)
pub struct PhaseScheduler {
    phases: Vec<Phase>,
    total_duration: f64,
    current_index: usize,
    has_transitioned: bool,
    clock: Clock,
    activity: Arc<dyn ActivityMonitor>,
    listeners: ListenerRegistry,
    sink: Arc<dyn DiagnosticSink>,
}

impl PhaseScheduler {
    /// Creates a scheduler over `phases` gated by `activity`.
    ///
    /// Uses the monotonic system clock and reports listener failures through
    /// `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::EmptySchedule`] if `phases` is empty, or a
    /// validation error for an empty name, an invalid duration, or a total
    /// that overflows.
    pub fn new(
        phases: Vec<Phase>,
        activity: impl ActivityMonitor + 'static,
    ) -> Result<Self, ScheduleError> {
        Self::builder().phases(phases).activity(activity).build()
    }

    /// Returns a builder for configuring time source, activity, and sink.
    #[must_use]
    pub fn builder() -> PhaseSchedulerBuilder {
        PhaseSchedulerBuilder::default()
    }

    fn validate_phase(index: usize, phase: &Phase) -> Result<(), ScheduleError> {
        if phase.name().is_empty() {
            return Err(ScheduleError::EmptyPhaseName { index });
        }
        let seconds = phase.duration_seconds();
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ScheduleError::InvalidDuration {
                name: phase.name().to_string(),
                seconds,
            });
        }
        Ok(())
    }

    fn sum_durations(phases: &[Phase]) -> f64 {
        phases.iter().map(Phase::duration_seconds).sum()
    }

    fn checked_total(total: f64, phases: usize) -> Result<f64, ScheduleError> {
        if total.is_finite() {
            Ok(total)
        } else {
            Err(ScheduleError::TotalOverflow { phases })
        }
    }

    /// Samples the clock and advances the current phase if needed.
    ///
    /// Before the host activity starts this is a no-op. The first effective
    /// poll starts the clock and records the initial phase without notifying
    /// listeners. Later polls notify listeners once for each forward change
    /// of the resolved phase, even when several phases elapsed between polls.
    ///
    /// Returns the transition, if one happened.
    pub fn poll(&mut self) -> Option<PhaseTransition> {
        if !self.clock.is_running() {
            if !self.activity.is_activity_running() {
                return None;
            }
            if self.clock.start() {
                debug!(total_seconds = self.total_duration, "activity started; clock running");
            }
        }

        let elapsed = self.clock.elapsed();
        let resolved = self.phase_index_at(elapsed);

        if !self.has_transitioned {
            self.has_transitioned = true;
            self.current_index = resolved;
            debug!(
                phase = %self.phases[resolved],
                index = resolved,
                elapsed,
                "initial phase resolved"
            );
            metrics::record_phase_index(resolved);
            return None;
        }

        if resolved <= self.current_index {
            return None;
        }

        let from = self.current_index;
        self.current_index = resolved;
        let phase = self.phases[resolved].clone();

        info!(from, to = resolved, phase = %phase, elapsed, "phase transition");
        metrics::record_transition(phase.name(), resolved);

        let listener_failures = self.listeners.dispatch(&phase, self.sink.as_ref());

        Some(PhaseTransition {
            from_phase: from,
            to_phase: resolved,
            phase,
            elapsed_seconds: elapsed,
            listener_failures,
        })
    }

    /// Returns the index of the phase active at `elapsed` seconds.
    ///
    /// Times at or past the total duration resolve to the last phase.
    #[must_use]
    pub fn phase_index_at(&self, elapsed: f64) -> usize {
        let last = self.phases.len() - 1;
        let mut accumulated = 0.0;
        for (index, phase) in self.phases.iter().enumerate() {
            let boundary = accumulated + phase.duration_seconds();
            if elapsed < boundary {
                return index;
            }
            accumulated = boundary;
        }
        last
    }

    /// Returns the phase active at `elapsed` seconds.
    #[must_use]
    pub fn phase_at(&self, elapsed: f64) -> &Phase {
        &self.phases[self.phase_index_at(elapsed)]
    }

    /// Returns the current phase (the first phase before any poll).
    #[must_use]
    pub fn current_phase(&self) -> &Phase {
        &self.phases[self.current_index]
    }

    /// Returns the index of the current phase.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns whether the current phase has the given name.
    #[must_use]
    pub fn is_current_phase(&self, name: &str) -> bool {
        self.current_phase().name() == name
    }

    /// Returns whether the current phase equals `phase` (by name).
    #[must_use]
    pub fn is_current(&self, phase: &Phase) -> bool {
        self.current_phase() == phase
    }

    /// Seconds since the clock started, 0 before start.
    #[must_use]
    pub fn elapsed_time(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Seconds left in the whole activity, clamped at zero.
    #[must_use]
    pub fn time_remaining(&self) -> f64 {
        self.clock.remaining().max(0.0)
    }

    /// Seconds left in the current phase.
    ///
    /// Before the clock starts this is the current phase's full duration.
    #[must_use]
    pub fn phase_time_remaining(&self) -> f64 {
        let duration = self.current_phase().duration_seconds();
        if !self.clock.is_running() {
            return duration;
        }
        let in_phase = self.clock.elapsed() - self.phase_start(self.current_index);
        (duration - in_phase).max(0.0)
    }

    /// Offset in seconds at which the phase at `index` begins.
    fn phase_start(&self, index: usize) -> f64 {
        Self::sum_durations(&self.phases[..index])
    }

    /// Sum of all phase durations in seconds.
    #[must_use]
    pub const fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Returns the configured phases in timeline order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the number of phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Returns the start/end offsets of every phase.
    #[must_use]
    pub fn timeline(&self) -> Vec<PhaseWindow> {
        let mut start = 0.0;
        self.phases
            .iter()
            .enumerate()
            .map(|(index, phase)| {
                let end = start + phase.duration_seconds();
                let window = PhaseWindow {
                    index,
                    name: phase.name().to_string(),
                    start_seconds: start,
                    end_seconds: end,
                };
                start = end;
                window
            })
            .collect()
    }

    /// Returns whether the clock has been started.
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.clock.is_running()
    }

    /// Returns whether the last phase is current.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.current_index == self.phases.len() - 1
    }

    /// Returns whether the whole scheduled duration has elapsed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.clock.is_running() && self.clock.elapsed() >= self.total_duration
    }

    /// Returns a handle to the listener registry.
    ///
    /// The handle can be cloned into listeners or other threads.
    #[must_use]
    pub const fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Registers a closure notified on every phase entry.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Phase) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Registers a [`PhaseListener`] implementation.
    pub fn add_phase_listener<L: PhaseListener + 'static>(&self, listener: L) -> ListenerId {
        self.listeners.add_listener(listener)
    }

    /// Unregisters a listener. Unknown ids are ignored.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Unregisters all listeners.
    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Appends a phase to the end of the timeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name or an invalid duration, or
    /// [`ScheduleError::TotalOverflow`] if the new total is not finite.
    pub fn append_phase(&mut self, phase: Phase) -> Result<(), ScheduleError> {
        let index = self.phases.len();
        self.insert_phase(index, phase)
    }

    /// Inserts a phase at `index`, shifting later phases back.
    ///
    /// The current index is not adjusted.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::IndexOutOfBounds`] if `index` is past the
    /// end, a validation error for the phase, or
    /// [`ScheduleError::TotalOverflow`]. The schedule is unchanged on error.
    pub fn insert_phase(&mut self, index: usize, phase: Phase) -> Result<(), ScheduleError> {
        if index > self.phases.len() {
            return Err(ScheduleError::IndexOutOfBounds {
                index,
                len: self.phases.len(),
            });
        }
        Self::validate_phase(index, &phase)?;
        let total = Self::checked_total(
            self.total_duration + phase.duration_seconds(),
            self.phases.len() + 1,
        )?;
        debug!(phase = %phase, index, "phase inserted");
        self.phases.insert(index, phase);
        self.total_duration = total;
        self.clock.set_total(total);
        Ok(())
    }

    /// Convenience for [`append_phase`](Self::append_phase) with a duration
    /// in seconds.
    ///
    /// # Errors
    ///
    /// See [`append_phase`](Self::append_phase).
    pub fn add_phase(&mut self, name: impl Into<String>, seconds: f64) -> Result<(), ScheduleError> {
        self.append_phase(Phase::new(name, seconds))
    }
}

impl std::fmt::Debug for PhaseScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseScheduler")
            .field("num_phases", &self.phases.len())
            .field("current_phase", &self.current_phase().name())
            .field("total_duration", &self.total_duration)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PhaseScheduler`].
///
/// Without an explicit activity monitor the activity is treated as running,
/// so the clock starts on the first poll.
#[derive(Default)]
pub struct PhaseSchedulerBuilder {
    phases: Vec<Phase>,
    activity: Option<Arc<dyn ActivityMonitor>>,
    time: Option<Arc<dyn TimeSource>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl PhaseSchedulerBuilder {
    /// Appends a phase with a duration in seconds.
    #[must_use]
    pub fn phase(self, name: impl Into<String>, seconds: f64) -> Self {
        self.add_phase(Phase::new(name, seconds))
    }

    /// Appends a phase with a duration in the given unit.
    #[must_use]
    pub fn phase_with_unit(self, name: impl Into<String>, duration: f64, unit: TimeUnit) -> Self {
        self.add_phase(Phase::with_unit(name, duration, unit))
    }

    /// Appends an existing phase.
    #[must_use]
    pub fn add_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Appends several phases.
    #[must_use]
    pub fn phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases.extend(phases);
        self
    }

    /// Sets the host activity monitor.
    #[must_use]
    pub fn activity(mut self, activity: impl ActivityMonitor + 'static) -> Self {
        self.activity = Some(Arc::new(activity));
        self
    }

    /// Sets the time source (monotonic system time by default).
    #[must_use]
    pub fn time_source(mut self, time: impl TimeSource + 'static) -> Self {
        self.time = Some(Arc::new(time));
        self
    }

    /// Sets the diagnostic sink for listener failures (`tracing` by default).
    #[must_use]
    pub fn sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Builds the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::EmptySchedule`] if no phases were added, or a
    /// validation error for an empty name, an invalid duration, or a total
    /// that overflows.
    pub fn build(self) -> Result<PhaseScheduler, ScheduleError> {
        if self.phases.is_empty() {
            return Err(ScheduleError::EmptySchedule);
        }
        for (index, phase) in self.phases.iter().enumerate() {
            PhaseScheduler::validate_phase(index, phase)?;
        }

        let total_duration = PhaseScheduler::checked_total(
            PhaseScheduler::sum_durations(&self.phases),
            self.phases.len(),
        )?;
        let time = self
            .time
            .unwrap_or_else(|| Arc::new(MonotonicTime::new()));

        Ok(PhaseScheduler {
            phases: self.phases,
            total_duration,
            current_index: 0,
            has_transitioned: false,
            clock: Clock::new(total_duration, time),
            activity: self
                .activity
                .unwrap_or_else(|| Arc::new(ActivityFlag::running())),
            listeners: ListenerRegistry::new(),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
        })
    }
}
