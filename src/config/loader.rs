//! Schedule loader
//!
//! Loading pipeline for schedule files:
//! 1. Size check against [`ConfigLimits`]
//! 2. Read and strip a UTF-8 BOM
//! 3. YAML parsing
//! 4. Deserialization to [`ScheduleConfig`]
//! 5. Validation

use std::path::Path;

use crate::config::schema::ScheduleConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

/// Options for the schedule loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for schedule size.
    pub limits: ConfigLimits,
}

/// Limits protecting the loader from oversized inputs.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum number of phases.
    pub max_phases: usize,

    /// Maximum schedule file size in bytes.
    pub max_config_size: u64,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_phases: env_or("PHASECLOCK_MAX_PHASES", 256),
            max_config_size: env_or("PHASECLOCK_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a schedule file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated schedule.
    pub config: ScheduleConfig,

    /// Warnings encountered during validation.
    pub warnings: Vec<ValidationIssue>,
}

/// Schedule file loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and validates a schedule file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The file exceeds the size limit
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.limits.max_config_size;
        if metadata.len() > limit {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw, path)
    }

    /// Parses and validates schedule text. `origin` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed or empty YAML, or a validation
    /// error listing every issue found.
    pub fn load_str(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let root: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: "Schedule file is empty".to_string(),
            });
        }

        let config: ScheduleConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: format!("Failed to deserialize schedule: {e}"),
            })?;

        let result = Validator::new().validate(&config, &self.options.limits);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: result.errors,
            });
        }

        Ok(LoadResult {
            config,
            warnings: result.warnings,
        })
    }
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
