//! Realtime error types.

use orbit_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] CoreError),

    #[error("Invalid realtime configuration: {0}")]
    InvalidConfig(String),

    #[error("No tokio runtime available to drive channel timers")]
    NoRuntime,
}

pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Failure reported by a subscriber callback.
///
/// Failures are isolated per callback: the broadcaster logs them and keeps
/// delivering to the remaining subscribers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SubscriberError(pub String);

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
