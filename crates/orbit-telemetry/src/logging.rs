//! Structured logging initialization.
//!
//! Output format is chosen once at startup. `ORBIT_LOG_FORMAT` names it
//! explicitly; otherwise `RUST_ENV=production` selects JSON and everything
//! else gets pretty output. `RUST_LOG` overrides [`DEFAULT_FILTER`].

use std::str::FromStr;

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming the log format.
pub const LOG_FORMAT_ENV: &str = "ORBIT_LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset. Targets match by prefix, so
/// `orbit` covers every `orbit_*` crate.
pub const DEFAULT_FILTER: &str = "info,orbit=debug";

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, with span context. For log shippers.
    Json,
    /// Multi-line, human-oriented.
    Pretty,
    /// Single-line, human-oriented.
    Compact,
}

impl LogFormat {
    /// Resolve from an explicit value, then `ORBIT_LOG_FORMAT`, then `RUST_ENV`.
    pub fn resolve(explicit: Option<&str>) -> TelemetryResult<Self> {
        let named = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(LOG_FORMAT_ENV).ok());
        if let Some(name) = named {
            return name.parse();
        }

        let production = std::env::var("RUST_ENV").is_ok_and(|v| v == "production");
        Ok(if production { Self::Json } else { Self::Pretty })
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(TelemetryError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Install the global subscriber with the format resolved from the
/// environment.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(LogFormat::resolve(None)?)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging_with(format: LogFormat) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_thread_names(true))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
