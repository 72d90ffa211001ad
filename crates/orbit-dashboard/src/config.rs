//! Dashboard configuration.

use serde::{Deserialize, Serialize};

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Enable dashboard server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrent WebSocket sessions.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Per-session queue of serialized emissions. A session that falls this
    /// far behind drops new emissions.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_enabled() -> bool {
    false
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> usize {
    10
}

fn default_broadcast_capacity() -> usize {
    64
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl DashboardConfig {
    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
