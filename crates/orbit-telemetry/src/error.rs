//! Telemetry error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    #[error("Unknown log format '{0}' (expected json, pretty or compact)")]
    InvalidLogFormat(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics encoding produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
