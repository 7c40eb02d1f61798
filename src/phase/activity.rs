//! Host activity lifecycle
//!
//! The scheduler only needs to know whether the timed activity is running so
//! it can start its clock on the first poll after the activity begins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Capability exposing whether the host's timed activity is running.
pub trait ActivityMonitor: Send + Sync {
    /// Returns `true` while the activity is running.
    fn is_activity_running(&self) -> bool;
}

impl<F> ActivityMonitor for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_activity_running(&self) -> bool {
        self()
    }
}

/// Lifecycle stage of an [`ActivityFlag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStage {
    /// Not started yet
    Pending,
    /// Started and not stopped
    Running,
    /// Stopped by the host
    Stopped,
}

impl ActivityStage {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Shareable start/stop handle for the host side of the lifecycle.
///
/// Clones observe the same stage. The host keeps one clone and calls
/// [`start`](Self::start) / [`stop`](Self::stop); the scheduler polls another.
/// Stages only move forward: a stopped activity cannot be restarted.
#[derive(Debug, Clone, Default)]
pub struct ActivityFlag {
    stage: Arc<AtomicU8>,
}

impl ActivityFlag {
    /// Creates a flag in the `Pending` stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag that is already running.
    #[must_use]
    pub fn running() -> Self {
        let flag = Self::new();
        flag.start();
        flag
    }

    /// Marks the activity as started.
    ///
    /// Returns `false` if it had already started or stopped.
    pub fn start(&self) -> bool {
        self.stage
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Marks the activity as stopped.
    pub fn stop(&self) {
        self.stage.store(2, Ordering::SeqCst);
    }

    /// Returns the current stage.
    #[must_use]
    pub fn stage(&self) -> ActivityStage {
        ActivityStage::from_u8(self.stage.load(Ordering::SeqCst))
    }

    /// Returns whether the activity has started (running or since stopped).
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.stage() != ActivityStage::Pending
    }

    /// Returns whether the activity has been stopped.
    #[must_use]
    pub fn has_stopped(&self) -> bool {
        self.stage() == ActivityStage::Stopped
    }
}

impl ActivityMonitor for ActivityFlag {
    fn is_activity_running(&self) -> bool {
        self.stage() == ActivityStage::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_lifecycle() {
        let flag = ActivityFlag::new();
        assert_eq!(flag.stage(), ActivityStage::Pending);
        assert!(!flag.is_activity_running());

        assert!(flag.start());
        assert!(flag.is_activity_running());
        assert!(flag.has_started());
        assert!(!flag.start());

        flag.stop();
        assert!(!flag.is_activity_running());
        assert!(flag.has_stopped());
        assert!(flag.has_started());
    }

    #[test]
    fn test_stopped_flag_cannot_restart() {
        let flag = ActivityFlag::running();
        flag.stop();
        assert!(!flag.start());
        assert_eq!(flag.stage(), ActivityStage::Stopped);
    }

    #[test]
    fn test_clones_share_stage() {
        let host = ActivityFlag::new();
        let scheduler_side = host.clone();
        host.start();
        assert!(scheduler_side.is_activity_running());
    }

    #[test]
    fn test_closure_is_monitor() {
        let monitor = || true;
        assert!(monitor.is_activity_running());
    }
}
