//! Orbital Guardian - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Orbital Guardian real-time broadcaster
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ORBIT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Log format: json, pretty or compact (can also be set via ORBIT_LOG_FORMAT)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_format = orbit_telemetry::LogFormat::resolve(args.log_format.as_deref())?;
    orbit_telemetry::init_logging_with(log_format)?;

    info!("Starting Orbital Guardian v{}", env!("CARGO_PKG_VERSION"));

    let config_path = orbit_guardian::AppConfig::resolve_path(args.config.as_deref());
    info!(config_path = %config_path, "Loading configuration");

    let config = orbit_guardian::AppConfig::from_file(&config_path)?;
    info!(
        dashboard_enabled = config.dashboard.enabled,
        dashboard_port = config.dashboard.port,
        alert_threshold = config.realtime.settings.alert_threshold,
        "Configuration loaded"
    );

    let app = orbit_guardian::Application::new(config)?;
    app.run().await?;

    Ok(())
}
