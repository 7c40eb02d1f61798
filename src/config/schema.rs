//! Schedule file schema
//!
//! Serde types for YAML schedule files. Durations are accepted either as a
//! number in a declared unit or as a `humantime` string (`"2m 30s"`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PhaseClockError};
use crate::phase::{Phase, PhaseScheduler, TimeUnit};

/// Control-loop cadence used by `run` when a schedule sets no `tick`.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// A schedule definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Human-readable schedule name.
    pub name: String,

    /// Poll cadence as a `humantime` string (e.g. `"50ms"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<String>,

    /// Phases in timeline order.
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

/// One phase entry in a schedule file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    /// Phase name.
    pub name: String,

    /// Phase length.
    pub duration: DurationValue,

    /// Unit for numeric durations (seconds when omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<TimeUnit>,
}

/// A duration written either as a number or as a `humantime` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    /// Numeric value, interpreted with the phase's `unit`.
    Number(f64),
    /// Text such as `"30s"` or `"2m 30s"`.
    Text(String),
}

impl PhaseConfig {
    /// Converts this entry into a [`Phase`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the duration text does not
    /// parse, or a unit is combined with a textual duration.
    pub fn to_phase(&self) -> Result<Phase, ConfigError> {
        match &self.duration {
            DurationValue::Number(value) => Ok(Phase::with_unit(
                self.name.clone(),
                *value,
                self.unit.unwrap_or_default(),
            )),
            DurationValue::Text(text) => {
                if self.unit.is_some() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("{}.unit", self.name),
                        value: text.clone(),
                        expected: "a numeric duration when 'unit' is set".to_string(),
                    });
                }
                let duration = parse_duration(text)?;
                Ok(Phase::from_duration(self.name.clone(), duration))
            }
        }
    }
}

impl ScheduleConfig {
    /// Converts every phase entry into a [`Phase`].
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn to_phases(&self) -> Result<Vec<Phase>, ConfigError> {
        self.phases.iter().map(PhaseConfig::to_phase).collect()
    }

    /// Returns the configured tick, or [`DEFAULT_TICK`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `tick` does not parse or is
    /// zero.
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        let Some(text) = &self.tick else {
            return Ok(DEFAULT_TICK);
        };
        let tick = parse_duration(text)?;
        if tick.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "tick".to_string(),
                value: text.clone(),
                expected: "a non-zero duration".to_string(),
            });
        }
        Ok(tick)
    }

    /// Builds a scheduler over this schedule using the system clock.
    ///
    /// # Errors
    ///
    /// Returns a config error for unparseable durations, or a schedule error
    /// if the phase list is rejected.
    pub fn build_scheduler(&self) -> Result<PhaseScheduler, PhaseClockError> {
        Ok(PhaseScheduler::builder().phases(self.to_phases()?).build()?)
    }
}

/// Parses a `humantime` duration string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for malformed input.
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(text.trim()).map_err(|e| ConfigError::InvalidValue {
        field: "duration".to_string(),
        value: text.to_string(),
        expected: format!("a duration like \"30s\" or \"2m 30s\" ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn parse(yaml: &str) -> ScheduleConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_numeric_and_text_durations() {
        let config = parse(
            r#"
name: ftc-match
phases:
  - name: Auto
    duration: 30
  - name: Transition
    duration: 8000
    unit: milliseconds
  - name: Teleop
    duration: "2m"
"#,
        );
        let phases = config.to_phases().unwrap();
        assert_eq!(phases.len(), 3);
        assert!((phases[0].duration_seconds() - 30.0).abs() < EPSILON);
        assert_eq!(phases[1].unit(), TimeUnit::Milliseconds);
        assert!((phases[1].duration_seconds() - 8.0).abs() < EPSILON);
        assert!((phases[2].duration_seconds() - 120.0).abs() < EPSILON);
    }

    #[test]
    fn test_compound_humantime() {
        let config = parse("name: x\nphases:\n  - name: Long\n    duration: \"1m 30s\"\n");
        let phases = config.to_phases().unwrap();
        assert!((phases[0].duration_seconds() - 90.0).abs() < EPSILON);
    }

    #[test]
    fn test_unit_with_text_is_rejected() {
        let config =
            parse("name: x\nphases:\n  - name: Auto\n    duration: \"30s\"\n    unit: minutes\n");
        assert!(matches!(
            config.to_phases(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_text_duration() {
        let config = parse("name: x\nphases:\n  - name: Auto\n    duration: soon\n");
        assert!(config.to_phases().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<ScheduleConfig, _> =
            serde_yaml::from_str("name: x\nphases: []\ncolour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_tick_default_and_parse() {
        let config = parse("name: x\n");
        assert_eq!(config.tick_interval().unwrap(), DEFAULT_TICK);

        let config = parse("name: x\ntick: 20ms\n");
        assert_eq!(config.tick_interval().unwrap(), Duration::from_millis(20));

        let config = parse("name: x\ntick: 0s\n");
        assert!(config.tick_interval().is_err());
    }

    #[test]
    fn test_build_scheduler() {
        let config = parse("name: x\nphases:\n  - name: Auto\n    duration: 30\n  - name: Park\n    duration: 3\n");
        let scheduler = config.build_scheduler().unwrap();
        assert_eq!(scheduler.phase_count(), 2);
        assert!((scheduler.total_duration() - 33.0).abs() < EPSILON);
    }

    #[test]
    fn test_build_scheduler_empty_is_schedule_error() {
        let config = parse("name: x\n");
        assert!(matches!(
            config.build_scheduler(),
            Err(PhaseClockError::Schedule(_))
        ));
    }
}
