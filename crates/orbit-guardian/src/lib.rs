//! Orbital Guardian real-time broadcaster service.
//!
//! Composition root for the broadcaster:
//! - Configuration loading (file + environment overrides)
//! - Broadcaster construction
//! - Dashboard bridge (REST + WebSocket)
//! - Graceful shutdown

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
