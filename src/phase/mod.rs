//! Phase scheduling
//!
//! Divides a bounded timed activity into named, fixed-duration phases and
//! reports which one is active on each poll.
//!
//! # Architecture
//!
//! - [`Phase`] / [`TimeUnit`]: Named duration with a declared unit
//! - [`Clock`]: One-shot stopwatch over an injected [`TimeSource`]
//! - [`PhaseScheduler`]: Resolves the active phase and dispatches transitions
//! - [`ListenerRegistry`]: Mutation-tolerant observer list
//! - [`ActivityMonitor`]: Host capability gating the clock start

pub mod activity;
pub mod clock;
pub mod definition;
pub mod listener;
pub mod scheduler;

pub use activity::{ActivityFlag, ActivityMonitor, ActivityStage};
pub use clock::{Clock, ManualTime, MonotonicTime, TimeSource};
pub use definition::{Phase, TimeUnit};
pub use listener::{
    DIAGNOSTIC_TARGET, DiagnosticSink, ListenerId, ListenerRegistry, PhaseListener, TracingSink,
    WriterSink,
};
pub use scheduler::{PhaseScheduler, PhaseSchedulerBuilder, PhaseTransition, PhaseWindow};
