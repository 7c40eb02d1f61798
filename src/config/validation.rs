//! Schedule validation
//!
//! Semantic checks on a deserialized [`ScheduleConfig`]. Validation collects
//! every issue instead of stopping at the first one so a user can fix a file
//! in one pass.

use std::collections::HashSet;

use crate::config::loader::ConfigLimits;
use crate::config::schema::{DurationValue, PhaseConfig, ScheduleConfig, parse_duration};
use crate::error::{Severity, ValidationIssue};

/// Names longer than this draw a warning.
const LONG_NAME_LEN: usize = 100;

/// Result of schedule validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Schedule validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a schedule and returns every error and warning found.
    pub fn validate(&mut self, config: &ScheduleConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_name(config);
        self.validate_tick(config);
        self.validate_phases(&config.phases);
        self.validate_limits(config, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_name(&mut self, config: &ScheduleConfig) {
        if config.name.trim().is_empty() {
            self.add_error("name", "Schedule name is required and cannot be empty");
        } else if config.name.len() > LONG_NAME_LEN {
            self.add_warning("name", "Schedule name is unusually long (> 100 characters)");
        }
    }

    fn validate_tick(&mut self, config: &ScheduleConfig) {
        let Some(text) = &config.tick else {
            return;
        };
        match parse_duration(text) {
            Ok(tick) if tick.is_zero() => self.add_error("tick", "Tick must be greater than zero"),
            Ok(_) => {}
            Err(_) => self.add_error(
                "tick",
                &format!("Invalid tick '{text}'. Expected a duration like \"50ms\""),
            ),
        }
    }

    fn validate_phases(&mut self, phases: &[PhaseConfig]) {
        if phases.is_empty() {
            self.add_error("phases", "At least one phase is required");
            return;
        }

        let mut seen = HashSet::new();
        let mut total = 0.0_f64;
        for (i, phase) in phases.iter().enumerate() {
            let path = format!("phases[{i}]");

            if phase.name.is_empty() {
                self.add_error(&format!("{path}.name"), "Phase name cannot be empty");
            } else if !seen.insert(phase.name.as_str()) {
                self.add_warning(
                    &format!("{path}.name"),
                    &format!(
                        "Duplicate phase name '{}'; phases compare equal by name",
                        phase.name
                    ),
                );
            }

            if let Some(seconds) = self.validate_duration(phase, &path) {
                total += seconds;
            }
        }

        if !total.is_finite() {
            self.add_error("phases", "Total schedule duration overflows");
        }
    }

    fn validate_duration(&mut self, phase: &PhaseConfig, path: &str) -> Option<f64> {
        let duration_path = format!("{path}.duration");
        let seconds = match &phase.duration {
            DurationValue::Number(value) => {
                if !value.is_finite() || *value < 0.0 {
                    self.add_error(
                        &duration_path,
                        &format!("Duration must be a finite, non-negative number (got {value})"),
                    );
                    return None;
                }
                let unit = phase.unit.unwrap_or_default();
                let seconds = unit.to_seconds(*value);
                if !seconds.is_finite() {
                    self.add_error(
                        &duration_path,
                        &format!("Duration {value:e} {unit} overflows when converted to seconds"),
                    );
                    return None;
                }
                seconds
            }
            DurationValue::Text(text) => {
                if phase.unit.is_some() {
                    self.add_error(
                        &format!("{path}.unit"),
                        "'unit' only applies to numeric durations",
                    );
                }
                match parse_duration(text) {
                    Ok(d) => d.as_secs_f64(),
                    Err(_) => {
                        self.add_error(
                            &duration_path,
                            &format!(
                                "Invalid duration '{text}'. Expected a number or a duration like \"30s\""
                            ),
                        );
                        return None;
                    }
                }
            }
        };

        if seconds <= 0.0 {
            self.add_warning(
                &duration_path,
                "Zero-length phase is skipped unless it is the last phase",
            );
        }
        Some(seconds)
    }

    fn validate_limits(&mut self, config: &ScheduleConfig, limits: &ConfigLimits) {
        if config.phases.len() > limits.max_phases {
            self.add_error(
                "phases",
                &format!(
                    "Too many phases: {} (maximum: {}). \
                     Set PHASECLOCK_MAX_PHASES to increase the limit.",
                    config.phases.len(),
                    limits.max_phases
                ),
            );
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
