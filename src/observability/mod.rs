//! Observability
//!
//! Logging, metrics, and structured event infrastructure for watching a
//! schedule progress.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, StopReason};
pub use logging::{LogFormat, LogOptions, init_logging};
pub use metrics::init_metrics;
