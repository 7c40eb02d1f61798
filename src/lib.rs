//! `phaseclock` - Time-driven phase scheduling for bounded activities
//!
//! This library splits a timed activity (a match, a drill, a countdown) into
//! named phases, tracks which phase is active from a monotonic clock, and
//! notifies observers when a new phase begins.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod phase;

pub use error::{PhaseClockError, Result};
pub use phase::{Phase, PhaseScheduler, TimeUnit};
