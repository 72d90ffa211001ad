//! Dashboard API types.
//!
//! These types are used for JSON serialization in REST and WebSocket APIs.

use orbit_core::{ChannelName, ChannelPayload};
use orbit_realtime::SystemStatus;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// WebSocket message types (tagged enum for type safety).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Sent once when the session opens.
    Welcome {
        timestamp_ms: i64,
        /// Channels this session is subscribed to.
        channels: Vec<ChannelName>,
        status: SystemStatus,
    },
    /// One channel emission.
    Emission {
        timestamp_ms: i64,
        payload: ChannelPayload,
    },
}

impl DashboardMessage {
    pub fn emission(payload: ChannelPayload) -> Self {
        Self::Emission {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }
}

/// Result of `POST /api/trigger/{channel}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub channel: ChannelName,
    pub delivered: usize,
    pub failed: usize,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /ws` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    /// Comma-separated channel names. All channels when absent.
    pub channels: Option<String>,
}

impl WsQuery {
    /// Requested channels, deduplicated in declaration order.
    pub fn channels(&self) -> Result<Vec<ChannelName>, DashboardError> {
        let Some(raw) = self.channels.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(ChannelName::ALL.to_vec());
        };

        let mut channels = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let channel = name
                .parse::<ChannelName>()
                .map_err(|_| DashboardError::UnknownChannel(name.to_string()))?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::Settings;
    use tokio_test::assert_err;

    fn query(channels: Option<&str>) -> WsQuery {
        WsQuery {
            channels: channels.map(str::to_string),
        }
    }

    #[test]
    fn test_channels_default_to_all() {
        assert_eq!(query(None).channels().unwrap(), ChannelName::ALL.to_vec());
        assert_eq!(query(Some("  ")).channels().unwrap(), ChannelName::ALL.to_vec());
    }

    #[test]
    fn test_channels_parsed_and_deduplicated() {
        let channels = query(Some("alerts, stats,alerts")).channels().unwrap();
        assert_eq!(channels, vec![ChannelName::Alerts, ChannelName::Stats]);
    }

    #[test]
    fn test_unknown_channel_rejected() {
        assert_err!(query(Some("debris")).channels());
        let err = query(Some("alerts,debris")).channels().unwrap_err();
        assert!(matches!(err, DashboardError::UnknownChannel(name) if name == "debris"));
    }

    #[test]
    fn test_message_tagging() {
        let msg = DashboardMessage::Emission {
            timestamp_ms: 1_706_400_000_000,
            payload: ChannelPayload::Settings(Settings::default()),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "emission");
        assert_eq!(json["payload"]["channel"], "settings");
        assert_eq!(json["payload"]["data"]["alertThreshold"], 0.7);
    }
}
