//! Connection-health tracking.
//!
//! Tracks connection status, heartbeat timing, simulated latency and message
//! counters. The state lives behind a lock and is only handed out as copies.
//!
//! Staleness is measured on the tokio clock against the last recorded
//! heartbeat only. Data emissions refresh the reported `last_heartbeat` but
//! not the staleness timer, so a heartbeat timer that fires late (runtime
//! stall, suspended host) is detected on its next fire.

use std::time::Duration;

use chrono::Utc;
use orbit_core::{ConnectionState, ConnectionStatus};
use orbit_telemetry::Metrics;
use parking_lot::RwLock;
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Latency sampled on connect (ms, half-open).
const CONNECT_LATENCY_MS: std::ops::Range<u64> = 50..150;
/// Latency sampled on each heartbeat (ms, half-open).
const HEARTBEAT_LATENCY_MS: std::ops::Range<u64> = 30..180;

/// Connection-health model.
pub struct ConnectionHealth {
    state: RwLock<ConnectionState>,
    /// Monotonic time of the last connect or heartbeat.
    last_beat: RwLock<Instant>,
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHealth {
    /// Create in the `disconnected` state.
    pub fn new() -> Self {
        Metrics::connection_state_set(ConnectionStatus::Disconnected.as_str());
        Self {
            state: RwLock::new(ConnectionState::new(Utc::now())),
            last_beat: RwLock::new(Instant::now()),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.read().status
    }

    /// Reset to a fresh connection: counters cleared, new connection time,
    /// latency resampled in [50, 150).
    pub fn mark_connected(&self) {
        let now = Utc::now();
        let latency = rand::thread_rng().gen_range(CONNECT_LATENCY_MS);
        {
            let mut state = self.state.write();
            state.status = ConnectionStatus::Connected;
            state.connection_time = now;
            state.last_heartbeat = now;
            state.messages_received = 0;
            state.data_latency_ms = latency;
        }
        *self.last_beat.write() = Instant::now();
        Metrics::connection_state_set(ConnectionStatus::Connected.as_str());
        info!(latency_ms = latency, "Connection marked connected");
    }

    /// Timers stopped; no data is flowing.
    pub fn mark_disconnected(&self) {
        self.set_status(ConnectionStatus::Disconnected);
        debug!("Connection marked disconnected");
    }

    /// Heartbeat went stale.
    pub fn mark_error(&self) {
        self.set_status(ConnectionStatus::Error);
        warn!("Connection marked error");
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.state.write().status = status;
        Metrics::connection_state_set(status.as_str());
    }

    /// Record a heartbeat. Ignored unless connected.
    ///
    /// Returns true when the heartbeat was recorded.
    pub fn record_heartbeat(&self) -> bool {
        let latency = rand::thread_rng().gen_range(HEARTBEAT_LATENCY_MS);
        let mut state = self.state.write();
        if state.status != ConnectionStatus::Connected {
            return false;
        }
        state.last_heartbeat = Utc::now();
        state.data_latency_ms = latency;
        drop(state);
        *self.last_beat.write() = Instant::now();

        Metrics::heartbeat_latency(latency as f64);
        true
    }

    /// Count one data emission and refresh the reported heartbeat timestamp.
    pub fn record_message(&self) {
        let mut state = self.state.write();
        state.messages_received += 1;
        state.last_heartbeat = Utc::now();
    }

    /// True when connected and no heartbeat was recorded for longer than
    /// `stale_after`.
    pub fn is_stale(&self, stale_after: Duration) -> bool {
        if self.state.read().status != ConnectionStatus::Connected {
            return false;
        }
        self.last_beat.read().elapsed() > stale_after
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ConnectionState {
        self.state.read().clone()
    }
}
