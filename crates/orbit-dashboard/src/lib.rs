//! orbit-dashboard - HTTP/WebSocket bridge for the Orbital Guardian broadcaster.
//!
//! Exposes the broadcaster to UI collaborators:
//!
//! - REST API for status, settings, connection health and manual triggers
//! - WebSocket sessions that subscribe to channels and stream emissions
//! - Prometheus `/metrics`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    orbit-guardian process                     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          Broadcaster (timers, registry, health)         │  │
//! │  └──────────────────────────┬─────────────────────────────┘  │
//! │                             │ subscribe / trigger / settings  │
//! │  ┌──────────────────────────┼─────────────────────────────┐  │
//! │  │       axum HTTP Server (port 8080)                      │  │
//! │  │  GET  /api/status, /api/settings, /api/connection       │  │
//! │  │  POST /api/settings, /api/trigger/{channel}             │  │
//! │  │  POST /api/refresh, /api/reconnect                      │  │
//! │  │  GET  /metrics                                          │  │
//! │  │  GET  /ws?channels=alerts,stats → one subscription      │  │
//! │  │       per channel, forwarded as tagged JSON             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use orbit_dashboard::{run_server, DashboardConfig};
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(run_server(broadcaster.clone(), DashboardConfig::default(), true, shutdown.clone()));
//! ```

mod config;
mod error;
mod server;
mod types;

pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use server::{create_router, run_server, serve, AppState, ConnectionGuard, ConnectionLimiter};
pub use types::{DashboardMessage, ErrorResponse, TriggerResponse, WsQuery};
