//! Realtime broadcaster configuration.

use std::time::Duration;

use orbit_core::{ChannelName, Settings};
use serde::{Deserialize, Serialize};

use crate::error::{RealtimeError, RealtimeResult};
use crate::scheduler::TimerKind;

/// Upper bound for any configured base period (ms). One day.
pub const MAX_BASE_PERIOD_MS: u64 = 86_400_000;

/// Longest period a timer is ever armed with.
pub const MAX_TIMER_PERIOD: Duration = Duration::from_secs(366 * 86_400);

/// Timer periods and initial settings for the broadcaster.
///
/// Data channel periods are the base values used at the reference update
/// frequency (10s); `Settings::update_frequency_seconds` scales them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Objects channel base period (ms).
    #[serde(default = "default_objects_interval_ms")]
    pub objects_interval_ms: u64,
    /// Alerts channel base period (ms).
    #[serde(default = "default_alerts_interval_ms")]
    pub alerts_interval_ms: u64,
    /// Conjunctions channel base period (ms).
    #[serde(default = "default_conjunctions_interval_ms")]
    pub conjunctions_interval_ms: u64,
    /// Stats channel base period (ms).
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
    /// Heartbeat period (ms). Not scaled by settings.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// A heartbeat older than this moves the connection to `error` (ms).
    #[serde(default = "default_heartbeat_stale_ms")]
    pub heartbeat_stale_ms: u64,
    /// Settings in effect at construction.
    #[serde(default)]
    pub settings: Settings,
}

fn default_objects_interval_ms() -> u64 {
    10_000
}

fn default_alerts_interval_ms() -> u64 {
    5_000
}

fn default_conjunctions_interval_ms() -> u64 {
    15_000
}

fn default_stats_interval_ms() -> u64 {
    30_000
}

fn default_heartbeat_interval_ms() -> u64 {
    10_000
}

fn default_heartbeat_stale_ms() -> u64 {
    30_000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            objects_interval_ms: default_objects_interval_ms(),
            alerts_interval_ms: default_alerts_interval_ms(),
            conjunctions_interval_ms: default_conjunctions_interval_ms(),
            stats_interval_ms: default_stats_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_stale_ms: default_heartbeat_stale_ms(),
            settings: Settings::default(),
        }
    }
}

impl RealtimeConfig {
    /// Validate periods and the initial settings.
    pub fn validate(&self) -> RealtimeResult<()> {
        let periods = [
            ("objects_interval_ms", self.objects_interval_ms),
            ("alerts_interval_ms", self.alerts_interval_ms),
            ("conjunctions_interval_ms", self.conjunctions_interval_ms),
            ("stats_interval_ms", self.stats_interval_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(RealtimeError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
            if value > MAX_BASE_PERIOD_MS {
                return Err(RealtimeError::InvalidConfig(format!(
                    "{name} must not exceed {MAX_BASE_PERIOD_MS}, got {value}"
                )));
            }
        }
        if self.heartbeat_stale_ms <= self.heartbeat_interval_ms {
            return Err(RealtimeError::InvalidConfig(format!(
                "heartbeat_stale_ms ({}) must exceed heartbeat_interval_ms ({})",
                self.heartbeat_stale_ms, self.heartbeat_interval_ms
            )));
        }
        self.settings.validate()?;
        Ok(())
    }

    /// Base period of a data channel. `None` for channels without a timer.
    pub fn base_period(&self, channel: ChannelName) -> Option<Duration> {
        let ms = match channel {
            ChannelName::Objects => self.objects_interval_ms,
            ChannelName::Alerts => self.alerts_interval_ms,
            ChannelName::Conjunctions => self.conjunctions_interval_ms,
            ChannelName::Stats => self.stats_interval_ms,
            ChannelName::Connection | ChannelName::Settings => return None,
        };
        Some(Duration::from_millis(ms))
    }

    /// Period of a data channel under the given settings.
    ///
    /// Capped at [`MAX_TIMER_PERIOD`]; never panics on oversized inputs.
    pub fn period(&self, channel: ChannelName, settings: &Settings) -> Option<Duration> {
        self.base_period(channel).map(|base| {
            Duration::try_from_secs_f64(base.as_secs_f64() * settings.cadence_factor())
                .map_or(MAX_TIMER_PERIOD, |period| period.min(MAX_TIMER_PERIOD))
        })
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn heartbeat_stale_after(&self) -> Duration {
        Duration::from_millis(self.heartbeat_stale_ms)
    }

    /// Timers to arm for the given settings.
    ///
    /// The heartbeat is always armed; data channels only when real-time
    /// updates are enabled.
    pub fn timer_plan(&self, settings: &Settings) -> Vec<(TimerKind, Duration)> {
        let mut plan = Vec::with_capacity(ChannelName::DATA.len() + 1);
        if settings.real_time_updates_enabled {
            for channel in ChannelName::DATA {
                if let Some(period) = self.period(channel, settings) {
                    plan.push((TimerKind::Channel(channel), period));
                }
            }
        }
        plan.push((TimerKind::Heartbeat, self.heartbeat_period()));
        plan
    }
}
