//! Payload records for the data channels.
//!
//! Field names serialize in camelCase, the shape dashboard consumers render.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Space objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Satellite,
    Debris,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    Active,
    Inactive,
    Decayed,
}

/// Coarse risk bucket for a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// A tracked space object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub country: String,
    pub launch_date: NaiveDate,
    /// Altitude in km.
    pub altitude: f64,
    /// Inclination in degrees.
    pub inclination: f64,
    /// Orbital period in minutes.
    pub period: f64,
    pub status: ObjectStatus,
    pub risk_level: RiskLevel,
    pub last_update: DateTime<Utc>,
    /// [longitude, latitude, altitude km].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    /// [x, y, z] km/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f64; 3]>,
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    /// Priority bucket for a risk score.
    ///
    /// Breakpoints are strict: exactly 0.9 is `High`, exactly 0.8 is `Medium`.
    pub fn from_risk(risk: f64) -> Self {
        if risk > 0.9 {
            Self::Critical
        } else if risk > 0.8 {
            Self::High
        } else if risk > 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A collision alert between two objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    pub id: String,
    /// Human-readable pair label, e.g. "SAT-2001 × DEB-4312".
    pub pair: String,
    /// Predicted time of closest approach.
    pub time: DateTime<Utc>,
    /// Risk score in [0, 1).
    pub risk: f64,
    /// Miss distance in km.
    pub miss_distance: f64,
    /// Altitude in km.
    pub altitude: f64,
    /// Relative velocity in km/s.
    pub relative_velocity: f64,
    pub status: AlertStatus,
    pub priority: AlertPriority,
    pub maneuver_suggested: bool,
    pub estimated_impact_time: DateTime<Utc>,
    pub confidence_level: f64,
}

// ============================================================================
// Conjunctions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Monitor,
    Contact,
    Maneuver,
}

impl RecommendedAction {
    pub fn from_risk(risk: f64) -> Self {
        if risk >= 0.8 {
            Self::Maneuver
        } else if risk >= 0.5 {
            Self::Contact
        } else {
            Self::Monitor
        }
    }
}

/// A predicted close approach between two tracked objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conjunction {
    pub id: String,
    pub object_a: String,
    pub object_b: String,
    pub time: DateTime<Utc>,
    pub miss_km: f64,
    pub risk: f64,
    pub probability: f64,
    pub recommended_action: RecommendedAction,
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Healthy,
    Warning,
    Critical,
}

/// Aggregate statistics for the overview cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_objects: u64,
    pub active_alerts: u64,
    pub upcoming_conjunctions: u64,
    pub high_risk_objects: u64,
    pub system_health: SystemHealth,
    /// Milliseconds.
    pub data_latency: u64,
    pub last_update: DateTime<Utc>,
    /// Objects per second.
    pub processing_rate: f64,
    /// Percentage.
    pub memory_usage: f64,
    /// Percentage.
    pub cpu_usage: f64,
}
