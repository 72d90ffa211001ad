//! Prometheus metrics for Orbital Guardian.
//!
//! Covers:
//! - Channel emissions and subscriber failures
//! - Subscriber count and scheduler lifecycle
//! - Connection health (state, heartbeat latency)
//! - Alert priorities
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error that should surface at
//! first use rather than be swallowed. It can only happen during lazy static
//! initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, register_int_gauge,
    register_int_gauge_vec, CounterVec, Encoder, Histogram, IntCounter, IntGauge, IntGaugeVec,
    TextEncoder,
};

use crate::error::TelemetryResult;

/// Total emissions per channel.
pub static EMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "orbit_emissions_total",
        "Total channel emissions fanned out to subscribers",
        &["channel"]
    )
    .unwrap()
});

/// Total subscriber callback failures per channel.
pub static SUBSCRIBER_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "orbit_subscriber_failures_total",
        "Total subscriber callbacks that returned an error",
        &["channel"]
    )
    .unwrap()
});

/// Current number of registered subscriber callbacks.
pub static SUBSCRIBERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "orbit_subscribers",
        "Registered subscriber callbacks across all channels"
    )
    .unwrap()
});

/// Scheduler running flag (1 = timers armed).
pub static SCHEDULER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "orbit_scheduler_running",
        "Scheduler running state (1=running)"
    )
    .unwrap()
});

/// Scheduler restarts caused by settings changes or reconnects.
pub static SCHEDULER_RESTARTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "orbit_scheduler_restarts_total",
        "Total scheduler restarts"
    )
    .unwrap()
});

/// Connection state machine current state.
/// Labels: state (connected/connecting/disconnected/error)
pub static CONNECTION_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "orbit_connection_state",
        "Connection state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Simulated data latency sampled at each heartbeat.
pub static HEARTBEAT_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "orbit_heartbeat_latency_ms",
        "Simulated data latency sampled by the heartbeat timer",
        vec![25.0, 50.0, 75.0, 100.0, 125.0, 150.0, 200.0, 300.0, 500.0]
    )
    .unwrap()
});

/// Alerts emitted per priority.
pub static ALERTS_EMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "orbit_alerts_emitted_total",
        "Alerts that cleared the risk threshold",
        &["priority"]
    )
    .unwrap()
});

const CONNECTION_STATES: [&str; 4] = ["connected", "connecting", "disconnected", "error"];

/// Metrics recording helpers.
pub struct Metrics;

impl Metrics {
    /// Record one emission on a channel.
    pub fn emission(channel: &str) {
        EMISSIONS_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Record a failed subscriber callback.
    pub fn subscriber_failed(channel: &str) {
        SUBSCRIBER_FAILURES_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Set the current subscriber count.
    pub fn subscribers(count: usize) {
        SUBSCRIBERS.set(count as i64);
    }

    /// Record scheduler started/stopped.
    pub fn scheduler_running(running: bool) {
        SCHEDULER_RUNNING.set(i64::from(running));
    }

    /// Record a scheduler restart.
    pub fn scheduler_restart() {
        SCHEDULER_RESTARTS_TOTAL.inc();
    }

    /// Set connection state. Only the active state is 1.
    pub fn connection_state_set(state: &str) {
        for s in CONNECTION_STATES {
            CONNECTION_STATE.with_label_values(&[s]).set(0);
        }
        CONNECTION_STATE.with_label_values(&[state]).set(1);
    }

    /// Record a heartbeat latency sample.
    pub fn heartbeat_latency(latency_ms: f64) {
        HEARTBEAT_LATENCY_MS.observe(latency_ms);
    }

    /// Record an emitted alert.
    pub fn alert_emitted(priority: &str) {
        ALERTS_EMITTED_TOTAL.with_label_values(&[priority]).inc();
    }
}

/// Encode every registered metric in the Prometheus text format.
pub fn gather_text() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_is_exclusive() {
        Metrics::connection_state_set("connected");
        Metrics::connection_state_set("error");

        assert_eq!(CONNECTION_STATE.with_label_values(&["error"]).get(), 1);
        assert_eq!(CONNECTION_STATE.with_label_values(&["connected"]).get(), 0);
        assert_eq!(CONNECTION_STATE.with_label_values(&["disconnected"]).get(), 0);
    }

    #[test]
    fn test_gather_text_contains_recorded_metrics() {
        Metrics::emission("alerts");
        Metrics::alert_emitted("critical");

        let text = gather_text().unwrap();
        assert!(text.contains("orbit_emissions_total"));
        assert!(text.contains("orbit_alerts_emitted_total"));
    }
}
