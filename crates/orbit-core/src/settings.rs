//! Run-time settings.
//!
//! `Settings` is owned by the broadcaster. External changes arrive as a
//! `SettingsUpdate` (every field optional), are validated as a whole, and are
//! only then merged.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Update frequency (seconds) at which data channels run at their base period.
pub const REFERENCE_UPDATE_FREQUENCY_SECS: u64 = 10;

/// Lower bound for interval-like settings (seconds).
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Upper bound for interval-like settings (seconds). One day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Broadcaster settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Object tracking interval (seconds).
    #[serde(
        rename = "trackingInterval",
        alias = "tracking_interval_seconds",
        default = "default_tracking_interval"
    )]
    pub tracking_interval_seconds: u64,
    /// Minimum risk an alert candidate needs to be surfaced (0.0-1.0).
    #[serde(
        rename = "alertThreshold",
        alias = "alert_threshold",
        default = "default_alert_threshold"
    )]
    pub alert_threshold: f64,
    /// Whether data channels run on timers at all.
    #[serde(
        rename = "realTimeUpdates",
        alias = "real_time_updates_enabled",
        default = "default_real_time_updates"
    )]
    pub real_time_updates_enabled: bool,
    /// Data channel cadence (seconds). 10 = base periods.
    #[serde(
        rename = "updateFrequency",
        alias = "update_frequency_seconds",
        default = "default_update_frequency"
    )]
    pub update_frequency_seconds: u64,
}

fn default_tracking_interval() -> u64 {
    30
}

fn default_alert_threshold() -> f64 {
    0.7
}

fn default_real_time_updates() -> bool {
    true
}

fn default_update_frequency() -> u64 {
    REFERENCE_UPDATE_FREQUENCY_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tracking_interval_seconds: default_tracking_interval(),
            alert_threshold: default_alert_threshold(),
            real_time_updates_enabled: default_real_time_updates(),
            update_frequency_seconds: default_update_frequency(),
        }
    }
}

impl Settings {
    /// Validate every field.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.alert_threshold)?;
        validate_interval("trackingInterval", self.tracking_interval_seconds)?;
        validate_interval("updateFrequency", self.update_frequency_seconds)?;
        Ok(())
    }

    /// Return a copy with `update` merged in, after validating the result.
    ///
    /// `self` is left untouched when validation fails.
    pub fn merged(&self, update: &SettingsUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(v) = update.tracking_interval_seconds {
            next.tracking_interval_seconds = v;
        }
        if let Some(v) = update.alert_threshold {
            next.alert_threshold = v;
        }
        if let Some(v) = update.real_time_updates_enabled {
            next.real_time_updates_enabled = v;
        }
        if let Some(v) = update.update_frequency_seconds {
            next.update_frequency_seconds = v;
        }
        next.validate()?;
        Ok(next)
    }

    /// Factor applied to data channel base periods.
    pub fn cadence_factor(&self) -> f64 {
        self.update_frequency_seconds as f64 / REFERENCE_UPDATE_FREQUENCY_SECS as f64
    }
}

fn validate_threshold(value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(CoreError::InvalidSetting {
            field: "alertThreshold",
            reason: format!("must be within [0, 1], got {value}"),
        });
    }
    Ok(())
}

fn validate_interval(field: &'static str, value: u64) -> Result<()> {
    if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&value) {
        return Err(CoreError::InvalidSetting {
            field,
            reason: format!(
                "must be within [{MIN_INTERVAL_SECS}, {MAX_INTERVAL_SECS}]s, got {value}"
            ),
        });
    }
    Ok(())
}

/// Partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(rename = "trackingInterval", default, skip_serializing_if = "Option::is_none")]
    pub tracking_interval_seconds: Option<u64>,
    #[serde(rename = "alertThreshold", default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<f64>,
    #[serde(rename = "realTimeUpdates", default, skip_serializing_if = "Option::is_none")]
    pub real_time_updates_enabled: Option<bool>,
    #[serde(rename = "updateFrequency", default, skip_serializing_if = "Option::is_none")]
    pub update_frequency_seconds: Option<u64>,
}

impl SettingsUpdate {
    /// Update that only changes the alert threshold.
    pub fn alert_threshold(value: f64) -> Self {
        Self {
            alert_threshold: Some(value),
            ..Default::default()
        }
    }

    /// Update that only changes the update frequency.
    pub fn update_frequency(seconds: u64) -> Self {
        Self {
            update_frequency_seconds: Some(seconds),
            ..Default::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.tracking_interval_seconds.is_none()
            && self.alert_threshold.is_none()
            && self.real_time_updates_enabled.is_none()
            && self.update_frequency_seconds.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.tracking_interval_seconds, 30);
        assert_eq!(settings.alert_threshold, 0.7);
        assert!(settings.real_time_updates_enabled);
        assert_eq!(settings.update_frequency_seconds, 10);
        assert_ok!(settings.validate());
        assert_eq!(settings.cadence_factor(), 1.0);
    }

    #[test]
    fn test_merge_partial() {
        let settings = Settings::default();
        let update = SettingsUpdate {
            alert_threshold: Some(0.95),
            update_frequency_seconds: Some(5),
            ..Default::default()
        };

        let merged = assert_ok!(settings.merged(&update));
        assert_eq!(merged.alert_threshold, 0.95);
        assert_eq!(merged.update_frequency_seconds, 5);
        // Untouched fields keep their value
        assert_eq!(merged.tracking_interval_seconds, 30);
        assert!(merged.real_time_updates_enabled);
        assert_eq!(merged.cadence_factor(), 0.5);
    }

    #[test]
    fn test_reject_threshold_out_of_range() {
        let settings = Settings::default();
        for bad in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let err = assert_err!(settings.merged(&SettingsUpdate::alert_threshold(bad)));
            assert!(matches!(
                err,
                CoreError::InvalidSetting {
                    field: "alertThreshold",
                    ..
                }
            ));
        }
        // Bounds are inclusive
        assert_ok!(settings.merged(&SettingsUpdate::alert_threshold(0.0)));
        assert_ok!(settings.merged(&SettingsUpdate::alert_threshold(1.0)));
    }

    #[test]
    fn test_reject_zero_intervals() {
        let settings = Settings::default();
        let err = assert_err!(settings.merged(&SettingsUpdate::update_frequency(0)));
        assert!(err.to_string().contains("updateFrequency"));

        let update = SettingsUpdate {
            tracking_interval_seconds: Some(0),
            ..Default::default()
        };
        let err = assert_err!(settings.merged(&update));
        assert!(err.to_string().contains("trackingInterval"));
    }

    #[test]
    fn test_reject_oversized_intervals() {
        let settings = Settings::default();
        for bad in [MAX_INTERVAL_SECS + 1, u64::MAX] {
            let err = assert_err!(settings.merged(&SettingsUpdate::update_frequency(bad)));
            assert!(err.to_string().contains("updateFrequency"));
        }

        let update = SettingsUpdate {
            tracking_interval_seconds: Some(u64::MAX),
            ..Default::default()
        };
        assert_err!(settings.merged(&update));

        let update = SettingsUpdate::update_frequency(MAX_INTERVAL_SECS);
        let merged = assert_ok!(settings.merged(&update));
        assert_eq!(merged.cadence_factor(), 8_640.0);
    }

    #[test]
    fn test_update_json_shape() {
        let update: SettingsUpdate =
            serde_json::from_str(r#"{"alertThreshold":0.9,"realTimeUpdates":false}"#).unwrap();
        assert_eq!(update.alert_threshold, Some(0.9));
        assert_eq!(update.real_time_updates_enabled, Some(false));
        assert!(update.tracking_interval_seconds.is_none());
        assert!(!update.is_empty());
        assert!(SettingsUpdate::default().is_empty());

        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"alertThreshold\":0.7"));
        assert!(json.contains("\"updateFrequency\":10"));
    }
}
