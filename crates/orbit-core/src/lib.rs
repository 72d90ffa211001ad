//! Core domain types for Orbital Guardian.
//!
//! This crate provides the types shared by the broadcaster and its consumers:
//! - `ChannelName`: The fixed set of publish streams
//! - `Settings`, `SettingsUpdate`: Run-time settings and their validated patch
//! - `ConnectionState`: Connection-health snapshot
//! - `SpaceObject`, `AlertItem`, `Conjunction`, `SystemStats`: Channel payload records
//! - `ChannelPayload`: Tagged union of everything a channel can emit

pub mod channel;
pub mod connection;
pub mod error;
pub mod orbital;
pub mod payload;
pub mod settings;

pub use channel::ChannelName;
pub use connection::{ConnectionState, ConnectionStatus};
pub use error::{CoreError, Result};
pub use orbital::{
    AlertItem, AlertPriority, AlertStatus, Conjunction, ObjectStatus, ObjectType,
    RecommendedAction, RiskLevel, SpaceObject, SystemHealth, SystemStats,
};
pub use payload::ChannelPayload;
pub use settings::{Settings, SettingsUpdate, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
