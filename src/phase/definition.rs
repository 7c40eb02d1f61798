//! Phase definitions
//!
//! A [`Phase`] is a named, fixed-duration slice of a timed activity. The
//! duration is kept in the unit it was declared in for display, and converted
//! to seconds for all scheduling arithmetic.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Unit a phase duration is expressed in.
///
/// Each unit maps to a fixed conversion factor into seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// 1e-9 seconds
    Nanoseconds,
    /// 1e-6 seconds
    Microseconds,
    /// 1e-3 seconds
    Milliseconds,
    /// The scheduling unit.
    #[default]
    Seconds,
    /// 60 seconds
    Minutes,
    /// 3600 seconds
    Hours,
    /// 86400 seconds
    Days,
}

impl TimeUnit {
    /// Converts `value` expressed in this unit into seconds.
    #[must_use]
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            Self::Nanoseconds => value / 1_000_000_000.0,
            Self::Microseconds => value / 1_000_000.0,
            Self::Milliseconds => value / 1_000.0,
            Self::Seconds => value,
            Self::Minutes => value * 60.0,
            Self::Hours => value * 3_600.0,
            Self::Days => value * 86_400.0,
        }
    }

    /// Short suffix used when rendering durations.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A named time window within a timed activity.
///
/// Equality and hashing consider the name only: two phases with the same
/// name and different durations compare equal. Callers rely on this to look
/// phases up by label (see [`PhaseScheduler::is_current`]).
///
/// [`PhaseScheduler::is_current`]: crate::phase::PhaseScheduler::is_current
#[derive(Debug, Clone)]
pub struct Phase {
    name: String,
    duration: f64,
    unit: TimeUnit,
}

impl Phase {
    /// Creates a phase with a duration in seconds.
    #[must_use]
    pub fn new(name: impl Into<String>, seconds: f64) -> Self {
        Self::with_unit(name, seconds, TimeUnit::Seconds)
    }

    /// Creates a phase with a duration in the given unit.
    #[must_use]
    pub fn with_unit(name: impl Into<String>, duration: f64, unit: TimeUnit) -> Self {
        Self {
            name: name.into(),
            duration,
            unit,
        }
    }

    /// Creates a phase from a [`std::time::Duration`].
    #[must_use]
    pub fn from_duration(name: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::new(name, duration.as_secs_f64())
    }

    /// Returns the phase name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the duration in its declared unit.
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the declared unit.
    #[must_use]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Returns the duration converted to seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.unit.to_seconds(self.duration)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Phase {}

impl Hash for Phase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_creation_with_name_and_duration() {
        let phase = Phase::new("Autonomous", 30.0);
        assert_eq!(phase.name(), "Autonomous");
        assert!((phase.duration_seconds() - 30.0).abs() < EPSILON);
    }

    #[test]
    fn test_display_is_name() {
        assert_eq!(Phase::new("Teleop", 150.0).to_string(), "Teleop");
    }

    #[test]
    fn test_default_unit_is_seconds() {
        assert_eq!(Phase::new("Test", 30.0).unit(), TimeUnit::Seconds);
    }

    #[test]
    fn test_milliseconds() {
        let phase = Phase::with_unit("Quick", 5000.0, TimeUnit::Milliseconds);
        assert!((phase.duration() - 5000.0).abs() < EPSILON);
        assert_eq!(phase.unit(), TimeUnit::Milliseconds);
        assert!((phase.duration_seconds() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_nanoseconds() {
        let phase = Phase::with_unit("Precise", 1_000_000_000.0, TimeUnit::Nanoseconds);
        assert!((phase.duration_seconds() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_every_unit_factor() {
        let cases = [
            (TimeUnit::Nanoseconds, 2e9, 2.0),
            (TimeUnit::Microseconds, 2e6, 2.0),
            (TimeUnit::Milliseconds, 2500.0, 2.5),
            (TimeUnit::Seconds, 2.5, 2.5),
            (TimeUnit::Minutes, 2.0, 120.0),
            (TimeUnit::Hours, 0.5, 1800.0),
            (TimeUnit::Days, 1.0, 86_400.0),
        ];
        for (unit, value, seconds) in cases {
            let phase = Phase::with_unit("p", value, unit);
            assert!(
                (phase.duration_seconds() - seconds).abs() < EPSILON,
                "{unit:?}: expected {seconds}, got {}",
                phase.duration_seconds()
            );
        }
    }

    #[test]
    fn test_from_std_duration() {
        let phase = Phase::from_duration("Park", std::time::Duration::from_millis(3_250));
        assert!((phase.duration_seconds() - 3.25).abs() < EPSILON);
    }

    #[test]
    fn test_equality_is_name_only() {
        let short = Phase::new("Auto", 15.0);
        let long = Phase::new("Auto", 30.0);
        assert_eq!(short, long);
        assert_ne!(short, Phase::new("Teleop", 15.0));
    }

    #[test]
    fn test_hash_is_name_only() {
        let mut set = HashSet::new();
        set.insert(Phase::new("Auto", 15.0));
        set.insert(Phase::with_unit("Auto", 30_000.0, TimeUnit::Milliseconds));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unit_deserializes_lowercase() {
        let unit: TimeUnit = serde_json::from_str("\"milliseconds\"").unwrap();
        assert_eq!(unit, TimeUnit::Milliseconds);
    }
}
