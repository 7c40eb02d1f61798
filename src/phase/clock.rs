//! Activity clock
//!
//! A one-shot stopwatch sized to the total length of a schedule. Time is read
//! from an injected [`TimeSource`] so schedulers can run against the real
//! monotonic clock or a manually driven one.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic time readings.
///
/// `now()` returns the time since an arbitrary fixed origin; only differences
/// between readings are meaningful. Readings must never decrease.
pub trait TimeSource: Send + Sync {
    /// Returns the current reading.
    fn now(&self) -> Duration;
}

/// Monotonic time backed by [`Instant`].
///
/// An optional speed factor scales real time, which lets a full schedule be
/// dry-run faster than real time.
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    origin: Instant,
    speed: f64,
}

impl MonotonicTime {
    /// Creates a real-time source.
    #[must_use]
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    /// Creates a source that runs `speed` times faster than real time.
    ///
    /// Non-finite or non-positive factors fall back to real time.
    #[must_use]
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            origin: Instant::now(),
            speed,
        }
    }

    /// Returns the speed factor.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    #[allow(clippy::float_cmp)]
    fn now(&self) -> Duration {
        let real = self.origin.elapsed();
        if self.speed == 1.0 {
            real
        } else {
            real.mul_f64(self.speed)
        }
    }
}

/// Manually driven time source.
///
/// Clones share the same reading, so a test can hand one clone to a
/// scheduler and advance time through another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    nanos: Arc<AtomicU64>,
}

impl ManualTime {
    /// Creates a source reading zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        self.nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(delta))
            })
            .ok();
    }

    /// Moves time forward by a number of seconds.
    ///
    /// Negative or non-finite values are ignored.
    pub fn advance_secs(&self, seconds: f64) {
        if let Ok(delta) = Duration::try_from_secs_f64(seconds) {
            self.advance(delta);
        }
    }

    /// Sets the reading to an absolute value.
    ///
    /// Readings never move backwards; earlier values are ignored.
    pub fn set(&self, at: Duration) {
        let at = u64::try_from(at.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_max(at, Ordering::SeqCst);
    }

    /// Sets the reading to an absolute number of seconds.
    pub fn set_secs(&self, seconds: f64) {
        if let Ok(at) = Duration::try_from_secs_f64(seconds) {
            self.set(at);
        }
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// One-shot stopwatch with a fixed total duration.
///
/// Reads before [`start`](Self::start) return deterministic defaults: zero
/// elapsed and the full total remaining. Starting twice is a no-op, never a
/// reset.
pub struct Clock {
    source: Arc<dyn TimeSource>,
    started_at: Option<Duration>,
    total_seconds: f64,
}

impl Clock {
    /// Creates a stopped clock of `total_seconds` reading from `source`.
    #[must_use]
    pub fn new(total_seconds: f64, source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            started_at: None,
            total_seconds,
        }
    }

    /// Starts the clock.
    ///
    /// Returns `true` if this call started it, `false` if it was already
    /// running.
    pub fn start(&mut self) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(self.source.now());
        true
    }

    /// Returns whether the clock has been started.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since start, or 0 if not started.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.started_at.map_or(0.0, |start| {
            self.source.now().saturating_sub(start).as_secs_f64()
        })
    }

    /// Seconds left before the total is reached, clamped at zero.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        (self.total_seconds - self.elapsed()).max(0.0)
    }

    /// Returns the total duration in seconds.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total_seconds
    }

    /// Changes the total duration. Elapsed time is unaffected.
    pub fn set_total(&mut self, total_seconds: f64) {
        self.total_seconds = total_seconds;
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("running", &self.is_running())
            .field("elapsed", &self.elapsed())
            .field("total_seconds", &self.total_seconds)
            .finish_non_exhaustive()
    }
}
