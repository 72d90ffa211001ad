//! Channel producers.
//!
//! Each producer is a pure function of the current settings, a clock reading
//! and a random source. They hold no state and never touch the broadcaster;
//! every call returns a fresh payload.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use orbit_core::{
    AlertItem, AlertPriority, AlertStatus, Conjunction, ObjectStatus, ObjectType,
    RecommendedAction, RiskLevel, Settings, SpaceObject, SystemHealth, SystemStats,
};
use rand::Rng;

/// Earth's gravitational parameter (km³/s²).
const EARTH_MU: f64 = 398_600.441_8;
/// Mean Earth radius (km).
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Alert/conjunction prediction horizon (ms).
const PREDICTION_HORIZON_MS: i64 = 2 * 60 * 60 * 1000;
/// Estimated impact horizon for alerts (ms).
const IMPACT_HORIZON_MS: i64 = 60 * 60 * 1000;

/// Stats baseline: total tracked objects and its jitter (half-open, centered).
pub const STATS_TOTAL_OBJECTS_BASE: u64 = 34_327;
pub const STATS_TOTAL_OBJECTS_JITTER: u64 = 50;

// ============================================================================
// Objects
// ============================================================================

struct CatalogueEntry {
    id: &'static str,
    name: &'static str,
    object_type: ObjectType,
    country: &'static str,
    launch: (i32, u32, u32),
    altitude: f64,
    inclination: f64,
    period: f64,
    status: ObjectStatus,
}

macro_rules! entry {
    ($id:expr, $name:expr, $ty:expr, $country:expr, $launch:expr, $alt:expr, $inc:expr, $period:expr, $status:expr) => {
        CatalogueEntry {
            id: $id,
            name: $name,
            object_type: $ty,
            country: $country,
            launch: $launch,
            altitude: $alt,
            inclination: $inc,
            period: $period,
            status: $status,
        }
    };
}

use ObjectStatus::{Active, Decayed, Inactive};
use ObjectType::{Debris, Satellite};

/// Tracked catalogue. The objects channel always emits exactly these.
const CATALOGUE: [CatalogueEntry; 10] = [
    entry!("SAT-2391", "Starlink-4521", Satellite, "USA", (2023, 3, 15), 550.0, 53.2, 95.5, Active),
    entry!("DEB-9921", "Cosmos-1408 Fragment", Debris, "Russia", (1982, 9, 20), 485.0, 82.6, 93.8, Inactive),
    entry!("SAT-4521", "Sentinel-2B", Satellite, "ESA", (2017, 3, 7), 786.0, 98.6, 100.4, Active),
    entry!("DEB-5563", "Fengyun-1C Fragment", Debris, "China", (1999, 5, 10), 865.0, 98.8, 102.1, Inactive),
    entry!("SAT-7821", "GPS III SV03", Satellite, "USA", (2020, 6, 30), 20_180.0, 55.0, 718.0, Active),
    entry!("DEB-2193", "Iridium-33 Fragment", Debris, "USA", (1997, 9, 14), 790.0, 86.4, 100.8, Inactive),
    entry!("SAT-1042", "Terra (EOS AM-1)", Satellite, "USA", (1999, 12, 18), 705.0, 98.2, 98.9, Active),
    entry!("SAT-6677", "OneWeb-0123", Satellite, "UK", (2022, 4, 1), 1_200.0, 87.4, 109.5, Active),
    entry!("DEB-8891", "ASAT Test Fragment", Debris, "India", (2008, 10, 22), 650.0, 97.9, 97.8, Inactive),
    entry!("DEB-1002", "SL-16 R/B Fragment", Debris, "Russia", (2019, 7, 5), 420.0, 51.6, 92.1, Decayed),
];

/// Number of objects emitted by [`produce_objects`].
pub const CATALOGUE_SIZE: usize = CATALOGUE.len();

/// Max altitude perturbation (km).
pub const ALTITUDE_JITTER_KM: f64 = 5.0;
/// Max period perturbation (minutes).
pub const PERIOD_JITTER_MIN: f64 = 0.05;

/// Snapshot of the tracked catalogue with small perturbations.
pub fn produce_objects<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<SpaceObject> {
    CATALOGUE
        .iter()
        .map(|e| {
            let altitude = e.altitude + rng.gen_range(-ALTITUDE_JITTER_KM..ALTITUDE_JITTER_KM);
            let period = e.period + rng.gen_range(-PERIOD_JITTER_MIN..PERIOD_JITTER_MIN);
            let (year, month, day) = e.launch;

            SpaceObject {
                id: e.id.to_string(),
                name: e.name.to_string(),
                object_type: e.object_type,
                country: e.country.to_string(),
                launch_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
                altitude,
                inclination: e.inclination,
                period,
                status: e.status,
                risk_level: sample_risk_level(rng),
                last_update: now,
                position: Some([
                    rng.gen_range(-180.0..180.0),
                    rng.gen_range(-90.0..90.0),
                    altitude,
                ]),
                velocity: Some(velocity_vector(rng, altitude, e.inclination)),
            }
        })
        .collect()
}

/// 20% high, then 50/50 medium or low among the rest.
fn sample_risk_level<R: Rng + ?Sized>(rng: &mut R) -> RiskLevel {
    if rng.gen_bool(0.2) {
        RiskLevel::High
    } else if rng.gen_bool(0.5) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Circular-orbit velocity (km/s) at a random point along the orbit.
fn velocity_vector<R: Rng + ?Sized>(rng: &mut R, altitude_km: f64, inclination_deg: f64) -> [f64; 3] {
    let speed = (EARTH_MU / (EARTH_RADIUS_KM + altitude_km)).sqrt();
    let anomaly = rng.gen_range(0.0..std::f64::consts::TAU);
    let inclination = inclination_deg.to_radians();
    [
        speed * anomaly.cos(),
        speed * anomaly.sin() * inclination.cos(),
        speed * anomaly.sin() * inclination.sin(),
    ]
}

// ============================================================================
// Alerts
// ============================================================================

/// Candidate count per alerts emission (inclusive range).
pub const MIN_ALERT_CANDIDATES: usize = 3;
pub const MAX_ALERT_CANDIDATES: usize = 7;

/// Threshold-filtered alerts, sorted by risk descending.
///
/// Draws between 3 and 7 candidates with risk in [0, 1) and keeps those with
/// `risk >= settings.alert_threshold`. The result may be empty.
pub fn produce_alerts<R: Rng + ?Sized>(
    rng: &mut R,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Vec<AlertItem> {
    let candidates = rng.gen_range(MIN_ALERT_CANDIDATES..=MAX_ALERT_CANDIDATES);
    let mut alerts = Vec::with_capacity(candidates);

    for i in 0..candidates {
        let risk: f64 = rng.gen();
        if risk < settings.alert_threshold {
            continue;
        }

        let status = if rng.gen_bool(0.2) {
            AlertStatus::Acknowledged
        } else {
            AlertStatus::Active
        };

        alerts.push(AlertItem {
            id: format!("AL-{}-{}", now.timestamp_millis(), i),
            pair: format!(
                "SAT-{} × DEB-{}",
                2000 + i,
                1000 + rng.gen_range(0..9999)
            ),
            time: now + ChronoDuration::milliseconds(rng.gen_range(0..PREDICTION_HORIZON_MS)),
            risk,
            miss_distance: rng.gen_range(0.0..3.0),
            altitude: rng.gen_range(400.0..800.0),
            relative_velocity: rng.gen_range(5.0..15.0),
            status,
            priority: AlertPriority::from_risk(risk),
            maneuver_suggested: risk > 0.8,
            estimated_impact_time: now
                + ChronoDuration::milliseconds(rng.gen_range(0..IMPACT_HORIZON_MS)),
            confidence_level: rng.gen_range(0.7..1.0),
        });
    }

    alerts.sort_by(|a, b| b.risk.total_cmp(&a.risk));
    alerts
}

// ============================================================================
// Conjunctions
// ============================================================================

/// Primary/secondary pairs under conjunction watch.
const CONJUNCTION_PAIRS: [(&str, &str); 5] = [
    ("SAT-2391", "DEB-9921"),
    ("SAT-4521", "DEB-5563"),
    ("SAT-7821", "DEB-2193"),
    ("SAT-6677", "DEB-8891"),
    ("SAT-1042", "DEB-1002"),
];

/// Upcoming conjunctions within the next two hours, soonest first.
pub fn produce_conjunctions<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<Conjunction> {
    let mut conjunctions: Vec<Conjunction> = CONJUNCTION_PAIRS
        .iter()
        .map(|(a, b)| {
            let risk: f64 = rng.gen();
            let miss_km = rng.gen_range(0.0..5.0);
            Conjunction {
                id: format!("CJ-{}", rng.gen_range(0..10_000)),
                object_a: a.to_string(),
                object_b: b.to_string(),
                time: now + ChronoDuration::milliseconds(rng.gen_range(0..PREDICTION_HORIZON_MS)),
                miss_km,
                risk,
                probability: risk * (-miss_km).exp(),
                recommended_action: RecommendedAction::from_risk(risk),
            }
        })
        .collect();

    conjunctions.sort_by_key(|c| c.time);
    conjunctions
}

// ============================================================================
// Stats
// ============================================================================

/// Aggregate stats with jitter around fixed baselines.
///
/// `processing_rate` is the catalogue swept per tracking interval.
pub fn produce_stats<R: Rng + ?Sized>(
    rng: &mut R,
    settings: &Settings,
    now: DateTime<Utc>,
) -> SystemStats {
    let total_objects = STATS_TOTAL_OBJECTS_BASE - STATS_TOTAL_OBJECTS_JITTER
        + rng.gen_range(0..2 * STATS_TOTAL_OBJECTS_JITTER);
    let system_health = if rng.gen_bool(0.1) {
        SystemHealth::Warning
    } else {
        SystemHealth::Healthy
    };

    SystemStats {
        total_objects,
        active_alerts: 8 + rng.gen_range(0..10),
        upcoming_conjunctions: 45 + rng.gen_range(0..20),
        high_risk_objects: 15 + rng.gen_range(0..8),
        system_health,
        data_latency: 50 + rng.gen_range(0..500),
        last_update: now,
        processing_rate: total_objects as f64 / settings.tracking_interval_seconds.max(1) as f64,
        memory_usage: rng.gen_range(35.0..70.0),
        cpu_usage: rng.gen_range(15.0..60.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::SettingsUpdate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x0B17)
    }

    #[test]
    fn test_objects_fixed_cardinality() {
        let mut rng = rng();
        let now = Utc::now();
        for _ in 0..20 {
            let objects = produce_objects(&mut rng, now);
            assert_eq!(objects.len(), CATALOGUE_SIZE);

            for (obj, base) in objects.iter().zip(CATALOGUE.iter()) {
                assert_eq!(obj.id, base.id);
                assert_eq!(obj.last_update, now);
                assert!((obj.altitude - base.altitude).abs() <= ALTITUDE_JITTER_KM);
                assert!((obj.period - base.period).abs() <= PERIOD_JITTER_MIN);
                let position = obj.position.unwrap();
                assert!((-180.0..180.0).contains(&position[0]));
                assert!((-90.0..90.0).contains(&position[1]));
            }
        }
    }

    #[test]
    fn test_objects_velocity_is_orbital() {
        let mut rng = rng();
        let objects = produce_objects(&mut rng, Utc::now());
        let leo = &objects[0];
        let [x, y, z] = leo.velocity.unwrap();
        let speed = (x * x + y * y + z * z).sqrt();
        // ~7.6 km/s at 550 km
        assert!((7.4..7.8).contains(&speed), "speed = {speed}");
    }

    #[test]
    fn test_alerts_respect_threshold_and_order() {
        let mut rng = rng();
        let now = Utc::now();
        for threshold in [0.0, 0.3, 0.7, 0.95, 1.0] {
            let settings = Settings::default()
                .merged(&SettingsUpdate::alert_threshold(threshold))
                .unwrap();
            for _ in 0..200 {
                let alerts = produce_alerts(&mut rng, &settings, now);
                assert!(alerts.len() <= MAX_ALERT_CANDIDATES);
                assert!(alerts.iter().all(|a| a.risk >= threshold));
                assert!(alerts.windows(2).all(|w| w[0].risk >= w[1].risk));
            }
        }
    }

    #[test]
    fn test_alerts_zero_threshold_keeps_every_candidate() {
        let mut rng = rng();
        let settings = Settings::default()
            .merged(&SettingsUpdate::alert_threshold(0.0))
            .unwrap();
        for _ in 0..100 {
            let alerts = produce_alerts(&mut rng, &settings, Utc::now());
            assert!((MIN_ALERT_CANDIDATES..=MAX_ALERT_CANDIDATES).contains(&alerts.len()));
        }
    }

    #[test]
    fn test_alert_fields_derived_from_risk() {
        let mut rng = rng();
        let settings = Settings::default()
            .merged(&SettingsUpdate::alert_threshold(0.0))
            .unwrap();
        let now = Utc::now();
        for _ in 0..100 {
            for alert in produce_alerts(&mut rng, &settings, now) {
                assert_eq!(alert.priority, AlertPriority::from_risk(alert.risk));
                assert_eq!(alert.maneuver_suggested, alert.risk > 0.8);
                assert!(alert.time >= now);
                assert!(alert.time < now + ChronoDuration::hours(2));
                assert!((0.7..1.0).contains(&alert.confidence_level));
                assert!(alert.pair.contains(" × DEB-"));
            }
        }
    }

    #[test]
    fn test_threshold_one_is_always_empty() {
        // Risk is drawn from [0, 1), so nothing clears a threshold of 1.0
        let mut rng = rng();
        let settings = Settings::default()
            .merged(&SettingsUpdate::alert_threshold(1.0))
            .unwrap();
        for _ in 0..100 {
            assert!(produce_alerts(&mut rng, &settings, Utc::now()).is_empty());
        }
    }

    #[test]
    fn test_conjunctions_within_horizon_sorted() {
        let mut rng = rng();
        let now = Utc::now();
        for _ in 0..50 {
            let conjunctions = produce_conjunctions(&mut rng, now);
            assert_eq!(conjunctions.len(), CONJUNCTION_PAIRS.len());
            assert!(conjunctions.windows(2).all(|w| w[0].time <= w[1].time));
            for c in &conjunctions {
                assert!(c.time >= now && c.time < now + ChronoDuration::hours(2));
                assert!((0.0..5.0).contains(&c.miss_km));
                assert!((0.0..1.0).contains(&c.risk));
                assert!(c.probability <= c.risk);
                assert_eq!(c.recommended_action, RecommendedAction::from_risk(c.risk));
                assert!(c.id.starts_with("CJ-"));
            }
        }
    }

    #[test]
    fn test_stats_within_bounds() {
        let mut rng = rng();
        let settings = Settings::default();
        let mut warnings = 0;
        for _ in 0..1000 {
            let stats = produce_stats(&mut rng, &settings, Utc::now());
            let low = STATS_TOTAL_OBJECTS_BASE - STATS_TOTAL_OBJECTS_JITTER;
            let high = STATS_TOTAL_OBJECTS_BASE + STATS_TOTAL_OBJECTS_JITTER;
            assert!((low..high).contains(&stats.total_objects));
            assert!((8..18).contains(&stats.active_alerts));
            assert!((45..65).contains(&stats.upcoming_conjunctions));
            assert!((15..23).contains(&stats.high_risk_objects));
            assert!((50..550).contains(&stats.data_latency));
            assert_ne!(stats.system_health, SystemHealth::Critical);
            if stats.system_health == SystemHealth::Warning {
                warnings += 1;
            }
        }
        // ~10% warning rate
        assert!((40..200).contains(&warnings), "warnings = {warnings}");
    }

    #[test]
    fn test_stats_processing_rate_follows_tracking_interval() {
        let mut rng = rng();
        let settings = Settings::default();
        let stats = produce_stats(&mut rng, &settings, Utc::now());
        let expected = stats.total_objects as f64 / 30.0;
        assert!((stats.processing_rate - expected).abs() < 1e-9);
    }
}
