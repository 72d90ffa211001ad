//! Connection-health snapshot types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelName;

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub const ALL: [ConnectionStatus; 4] = [
        Self::Connected,
        Self::Connecting,
        Self::Disconnected,
        Self::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the connection-health model.
///
/// Consumers only ever receive copies; mutating one has no effect on the
/// broadcaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_heartbeat: DateTime<Utc>,
    /// Simulated data latency in milliseconds.
    #[serde(rename = "dataLatency")]
    pub data_latency_ms: u64,
    pub subscribed_channels: Vec<ChannelName>,
    pub messages_received: u64,
    pub connection_time: DateTime<Utc>,
}

impl ConnectionState {
    /// Initial state: disconnected, nothing received yet.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            last_heartbeat: now,
            data_latency_ms: 0,
            subscribed_channels: Vec::new(),
            messages_received: 0,
            connection_time: now,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
