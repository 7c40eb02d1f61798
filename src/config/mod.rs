//! Schedule configuration
//!
//! Loading and validation of YAML schedule files.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoaderOptions};
pub use schema::{DEFAULT_TICK, DurationValue, PhaseConfig, ScheduleConfig, parse_duration};
pub use validation::{ValidationResult, Validator};
