//! `run` command handler
//!
//! Drives a schedule in (optionally accelerated) real time on a `tokio`
//! interval until the whole duration has elapsed or the run is cancelled.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::RunArgs;
use crate::config::ConfigLoader;
use crate::error::{ListenerError, PhaseClockError};
use crate::observability::{Event, EventEmitter, StopReason, init_metrics};
use crate::phase::{ActivityFlag, MonotonicTime, Phase, PhaseScheduler};

/// Outcome of a driven schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the run ended.
    pub reason: StopReason,
    /// Number of dispatched transitions.
    pub transitions: u64,
    /// Activity time at the end of the run.
    pub elapsed_seconds: f64,
    /// Phase active at the end of the run.
    pub final_phase: String,
}

/// Load a schedule and run it.
///
/// # Errors
///
/// Returns a config error if the schedule does not load, a usage error for
/// a zero `--tick`, or an I/O error if the events file or metrics endpoint
/// cannot be opened.
pub async fn run(
    args: &RunArgs,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<(), PhaseClockError> {
    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    info!(config = %args.config.display(), "loading schedule");
    let loaded = ConfigLoader::with_defaults().load(&args.config)?;
    for warning in &loaded.warnings {
        warn!(location = %warning.path, "{}", warning.message);
    }
    let config = loaded.config;

    let tick = match args.tick {
        Some(tick) if tick.is_zero() => {
            return Err(PhaseClockError::Usage(
                "--tick must be greater than zero".to_string(),
            ));
        }
        Some(tick) => tick,
        None => config.tick_interval()?,
    };

    let emitter = open_emitter(args.events.as_deref())?;
    let events_on_stdout = args.events.as_deref() == Some(Path::new("-"));

    let activity = ActivityFlag::new();
    let scheduler = PhaseScheduler::builder()
        .phases(config.to_phases()?)
        .time_source(MonotonicTime::with_speed(args.speed))
        .activity(activity.clone())
        .build()?;

    if !quiet && !events_on_stdout {
        scheduler.add_listener(print_transition);
    }

    info!(
        schedule = %config.name,
        phases = scheduler.phase_count(),
        total_seconds = scheduler.total_duration(),
        tick = ?tick,
        speed = args.speed,
        "starting schedule"
    );

    let summary = drive(scheduler, &activity, tick, &emitter, &config.name, cancel).await;

    info!(
        reason = %summary.reason,
        transitions = summary.transitions,
        elapsed = summary.elapsed_seconds,
        "schedule finished"
    );
    Ok(())
}

/// Polls `scheduler` every `tick` until it finishes or `cancel` fires.
///
/// Starts the activity, emits `ScheduleStarted`, one `PhaseEntered` per
/// transition, and `ScheduleFinished` at the end.
pub async fn drive(
    mut scheduler: PhaseScheduler,
    activity: &ActivityFlag,
    tick: Duration,
    emitter: &EventEmitter,
    schedule_name: &str,
    cancel: CancellationToken,
) -> RunSummary {
    activity.start();
    scheduler.poll();

    emitter.emit(Event::ScheduleStarted {
        timestamp: Utc::now(),
        schedule_name: schedule_name.to_owned(),
        phase_count: scheduler.phase_count(),
        total_seconds: scheduler.total_duration(),
        initial_phase: scheduler.current_phase().name().to_owned(),
    });

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut transitions = 0;

    let reason = loop {
        tokio::select! {
            () = cancel.cancelled() => break StopReason::Cancelled,
            _ = interval.tick() => {
                if let Some(transition) = scheduler.poll() {
                    transitions += 1;
                    for event in Event::from_transition(&transition) {
                        emitter.emit(event);
                    }
                }
                // Polled after the deadline, so the last phase has been dispatched.
                if scheduler.is_finished() {
                    break StopReason::Completed;
                }
            }
        }
    };

    activity.stop();

    let summary = RunSummary {
        reason,
        transitions,
        elapsed_seconds: scheduler.elapsed_time(),
        final_phase: scheduler.current_phase().name().to_owned(),
    };

    emitter.emit(Event::ScheduleFinished {
        timestamp: Utc::now(),
        reason,
        final_phase: summary.final_phase.clone(),
        elapsed_seconds: summary.elapsed_seconds,
        transitions,
    });

    summary
}

fn open_emitter(target: Option<&Path>) -> Result<EventEmitter, PhaseClockError> {
    Ok(match target {
        None => EventEmitter::noop(),
        Some(path) if path == Path::new("-") => EventEmitter::stdout(),
        Some(path) => EventEmitter::from_file(path)?,
    })
}

fn print_transition(phase: &Phase) -> Result<(), ListenerError> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "-> {phase} ({:.3}s)", phase.duration_seconds())?;
    Ok(())
}
