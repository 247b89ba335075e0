//! Shared utilities for the Sprout engine.

pub mod logging;
pub mod time;
pub mod tracing_spans;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::format_duration_ms;
