//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Realtime error: {0}")]
    Realtime(#[from] orbit_realtime::RealtimeError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] orbit_dashboard::DashboardError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] orbit_telemetry::TelemetryError),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
