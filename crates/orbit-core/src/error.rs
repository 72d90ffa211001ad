//! Error types for orbit-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: String,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
