//! Channel names.
//!
//! A channel is an independently scheduled stream of typed payloads with its
//! own subscriber set. The set of channels is fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the fixed publish streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    /// Tracked space-object snapshot.
    Objects,
    /// Threshold-filtered collision alerts.
    Alerts,
    /// Upcoming conjunction predictions.
    Conjunctions,
    /// Aggregate system statistics.
    Stats,
    /// Connection-health snapshots.
    Connection,
    /// Settings snapshots (emitted on every settings change).
    Settings,
}

impl ChannelName {
    /// Every channel, in declaration order.
    pub const ALL: [ChannelName; 6] = [
        Self::Objects,
        Self::Alerts,
        Self::Conjunctions,
        Self::Stats,
        Self::Connection,
        Self::Settings,
    ];

    /// Channels whose payloads are synthesized by a producer on a timer.
    pub const DATA: [ChannelName; 4] = [
        Self::Objects,
        Self::Alerts,
        Self::Conjunctions,
        Self::Stats,
    ];

    /// Wire name of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Alerts => "alerts",
            Self::Conjunctions => "conjunctions",
            Self::Stats => "stats",
            Self::Connection => "connection",
            Self::Settings => "settings",
        }
    }

    /// True for channels driven by a data producer.
    pub fn is_data(&self) -> bool {
        Self::DATA.contains(self)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownChannel(s.to_string()))
    }
}
