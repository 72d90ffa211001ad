//! Dashboard error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use orbit_telemetry::TelemetryError;
use thiserror::Error;

use crate::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Metrics export is disabled")]
    MetricsDisabled,

    #[error("Metrics export failed: {0}")]
    Metrics(#[from] TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

impl DashboardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownChannel(_) | Self::MetricsDisabled => StatusCode::NOT_FOUND,
            Self::InvalidSettings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Metrics(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
