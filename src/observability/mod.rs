//! Observability for schema lifecycle events
//!
//! Structured, synchronous JSON logging only. Logging is read-only with no
//! side effects on reconciliation; there are no background threads.

mod logger;

pub use logger::{LogLevel, Logger};
