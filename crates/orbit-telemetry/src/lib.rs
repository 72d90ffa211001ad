//! Prometheus metrics and structured logging for Orbital Guardian.
//!
//! - Prometheus metrics for channel emissions, subscriber failures and
//!   scheduler lifecycle
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use metrics::{gather_text, Metrics};
