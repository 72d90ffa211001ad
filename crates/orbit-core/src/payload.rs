//! Channel payloads.

use serde::Serialize;

use crate::channel::ChannelName;
use crate::connection::ConnectionState;
use crate::orbital::{AlertItem, Conjunction, SpaceObject, SystemStats};
use crate::settings::Settings;

/// One emitted value. Every emission builds a fresh payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel", content = "data", rename_all = "lowercase")]
pub enum ChannelPayload {
    Objects(Vec<SpaceObject>),
    Alerts(Vec<AlertItem>),
    Conjunctions(Vec<Conjunction>),
    Stats(SystemStats),
    Connection(ConnectionState),
    Settings(Settings),
}

impl ChannelPayload {
    /// Channel this payload belongs to.
    pub fn channel(&self) -> ChannelName {
        match self {
            Self::Objects(_) => ChannelName::Objects,
            Self::Alerts(_) => ChannelName::Alerts,
            Self::Conjunctions(_) => ChannelName::Conjunctions,
            Self::Stats(_) => ChannelName::Stats,
            Self::Connection(_) => ChannelName::Connection,
            Self::Settings(_) => ChannelName::Settings,
        }
    }

    pub fn as_alerts(&self) -> Option<&[AlertItem]> {
        match self {
            Self::Alerts(alerts) => Some(alerts),
            _ => None,
        }
    }

    pub fn as_stats(&self) -> Option<&SystemStats> {
        match self {
            Self::Stats(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&ConnectionState> {
        match self {
            Self::Connection(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_settings(&self) -> Option<&Settings> {
        match self {
            Self::Settings(settings) => Some(settings),
            _ => None,
        }
    }
}
