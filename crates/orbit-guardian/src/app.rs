//! Main application orchestration.
//!
//! Composition root: owns the broadcaster, starts the dashboard bridge and
//! tears everything down on Ctrl-C.

use orbit_dashboard::DashboardResult;
use orbit_realtime::Broadcaster;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Main application.
pub struct Application {
    config: AppConfig,
    broadcaster: Broadcaster,
    shutdown: CancellationToken,
}

impl Application {
    /// Create the application. Must be called inside a tokio runtime.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let broadcaster = Broadcaster::new(config.realtime.clone())?;
        Ok(Self {
            config,
            broadcaster,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Token that stops `run` when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until Ctrl-C, a shutdown request, or the dashboard exiting.
    pub async fn run(self) -> AppResult<()> {
        let mut dashboard = self.spawn_dashboard();

        let finished = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                None
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown requested");
                None
            }
            result = wait_dashboard(&mut dashboard) => Some(result),
        };

        self.shutdown.cancel();
        let result = match finished {
            Some(result) => result,
            None => match dashboard {
                Some(handle) => handle.await,
                None => Ok(Ok(())),
            },
        };

        self.broadcaster.shutdown();
        info!("Shutting down");

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "Dashboard server failed");
                Err(e.into())
            }
            Err(e) => {
                warn!(error = %e, "Dashboard task ended abnormally");
                Err(e.into())
            }
        }
    }

    fn spawn_dashboard(&self) -> Option<JoinHandle<DashboardResult<()>>> {
        if !self.config.dashboard.enabled {
            info!("Dashboard disabled");
            return None;
        }

        Some(tokio::spawn(orbit_dashboard::run_server(
            self.broadcaster.clone(),
            self.config.dashboard.clone(),
            self.config.telemetry.metrics_enabled,
            self.shutdown.clone(),
        )))
    }
}

async fn wait_dashboard(
    dashboard: &mut Option<JoinHandle<DashboardResult<()>>>,
) -> Result<DashboardResult<()>, tokio::task::JoinError> {
    match dashboard {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
