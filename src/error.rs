//! Error types for `phaseclock`
//!
//! Construction-time schedule errors, configuration loading errors, the
//! observer failure type handed back by listeners, and the top-level error
//! with its process exit code mapping.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `phaseclock` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Schedule construction or mutation error
    pub const SCHEDULE_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `phaseclock` operations.
///
/// Aggregates all domain-specific errors and maps each to an exit code.
#[derive(Debug, Error)]
pub enum PhaseClockError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Schedule construction error
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),
}

impl PhaseClockError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Schedule(_) => ExitCode::SCHEDULE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
        }
    }
}

// ============================================================================
// Schedule Errors
// ============================================================================

/// Fatal errors raised while building or mutating a phase schedule.
///
/// These surface at construction time and are not recoverable; a scheduler
/// is never handed out in an invalid state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// No phases were provided
    #[error("at least one phase must be provided")]
    EmptySchedule,

    /// A phase was given an empty name
    #[error("phase at index {index} has an empty name")]
    EmptyPhaseName {
        /// Position of the offending phase
        index: usize,
    },

    /// A phase duration is negative, NaN, or infinite
    #[error("phase '{name}' has invalid duration {seconds}s (must be finite and non-negative)")]
    InvalidDuration {
        /// Name of the offending phase
        name: String,
        /// The converted duration in seconds
        seconds: f64,
    },

    /// Phase durations sum past the largest representable number of seconds
    #[error("total schedule duration overflows ({phases} phases)")]
    TotalOverflow {
        /// Number of phases that would be scheduled
        phases: usize,
    },

    /// Insertion index past the end of the phase list
    #[error("insert index {index} out of bounds for {len} phases")]
    IndexOutOfBounds {
        /// Requested insertion index
        index: usize,
        /// Number of phases at the time of the call
        len: usize,
    },
}

// ============================================================================
// Listener Errors
// ============================================================================

/// Failure reported by a phase listener.
///
/// Returned from [`PhaseListener::on_phase_entered`](crate::phase::PhaseListener)
/// and caught at the dispatch site; it is reported to the diagnostic sink and
/// never reaches the poller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ListenerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Schedule file loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(.errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// File exceeds the configured size limit
    #[error("{path} is {size} bytes (limit: {limit})")]
    TooLarge {
        /// Path to the configuration file
        path: PathBuf,
        /// Actual size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "phases[2].duration")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Legal but likely unintended
    Warning,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `phaseclock` operations.
pub type Result<T> = std::result::Result<T, PhaseClockError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SCHEDULE_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_schedule_error_exit_code() {
        let err: PhaseClockError = ScheduleError::EmptySchedule.into();
        assert_eq!(err.exit_code(), ExitCode::SCHEDULE_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: PhaseClockError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: PhaseClockError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = PhaseClockError::Usage("bad flag".to_string());
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn test_total_overflow_exit_code() {
        let err: PhaseClockError = ScheduleError::TotalOverflow { phases: 2 }.into();
        assert_eq!(err.exit_code(), ExitCode::SCHEDULE_ERROR);
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_empty_schedule_message() {
        assert_eq!(
            ScheduleError::EmptySchedule.to_string(),
            "at least one phase must be provided"
        );
    }

    #[test]
    fn test_invalid_duration_message() {
        let err = ScheduleError::InvalidDuration {
            name: "Auto".to_string(),
            seconds: -1.0,
        };
        assert!(err.to_string().contains("Auto"));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_listener_error_from_io() {
        let err: ListenerError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into();
        assert_eq!(err.message(), "pipe closed");
        assert_eq!(err.to_string(), "pipe closed");
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "phases[0].duration".to_string(),
            message: "duration must be non-negative".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: duration must be non-negative at phases[0].duration"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "phases[3].name".to_string(),
            message: "duplicate phase name 'Auto'".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(
            issue.to_string(),
            "warning: duplicate phase name 'Auto' at phases[3].name"
        );
    }

    #[test]
    fn test_validation_error_lists_issues() {
        let err = ConfigError::ValidationError {
            path: "match.yaml".to_string(),
            errors: vec![ValidationIssue {
                path: "phases".to_string(),
                message: "at least one phase is required".to_string(),
                severity: Severity::Error,
            }],
        };
        let text = err.to_string();
        assert!(text.contains("match.yaml"));
        assert!(text.contains("at least one phase is required"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("match.yaml"),
            line: Some(4),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("match.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
