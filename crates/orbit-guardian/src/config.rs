//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. serde defaults on every field
//! 2. the TOML file (`--config` > `ORBIT_CONFIG` > `config/default.toml`)
//! 3. `ORBIT__<SECTION>__<FIELD>` environment variables

use std::path::Path;

use orbit_dashboard::DashboardConfig;
use orbit_realtime::RealtimeConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ORBIT_CONFIG";
/// Config file used when neither `--config` nor `ORBIT_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
/// Prefix for per-field environment overrides.
pub const ENV_PREFIX: &str = "ORBIT";

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Serve Prometheus metrics on the dashboard.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Resolve the config path: explicit argument, then `ORBIT_CONFIG`, then
    /// the default path.
    pub fn resolve_path(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path` layered with environment overrides, then validate.
    ///
    /// A missing file falls back to defaults (plus environment overrides).
    pub fn from_file(path: &str) -> AppResult<Self> {
        let mut builder = config::Config::builder();
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::from(Path::new(path)));
        } else {
            warn!(path = %path, "Config file not found, using defaults");
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.realtime
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        if self.dashboard.enabled {
            if self.dashboard.max_connections == 0 {
                return Err(AppError::Config(
                    "dashboard.max_connections must be greater than zero".to_string(),
                ));
            }
            if self.dashboard.broadcast_capacity == 0 {
                return Err(AppError::Config(
                    "dashboard.broadcast_capacity must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}
