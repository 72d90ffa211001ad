//! Broadcaster facade.
//!
//! Composes the channel registry, connection health, producers and scheduler
//! behind one cloneable handle:
//!
//! - `subscribe` / `SubscriptionHandle::unsubscribe`
//! - `trigger_update` (manual, out-of-band emission)
//! - `update_settings` (validated merge, restarts timers while running)
//! - `reconnect`
//! - `system_status`, `settings`, `connection_status` (copies only)
//!
//! The scheduler runs iff at least one subscriber is registered.
//!
//! # Locking
//!
//! Lifecycle transitions (subscribe, unsubscribe, settings, reconnect) are
//! serialized by a re-entrant lock so that a callback may subscribe or
//! unsubscribe from inside an emission. Callbacks are always invoked with the
//! registry, settings and health locks released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use orbit_core::{
    ChannelName, ChannelPayload, ConnectionState, Settings, SettingsUpdate,
};
use orbit_telemetry::Metrics;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info, trace, warn};

use crate::config::RealtimeConfig;
use crate::error::{RealtimeError, RealtimeResult, SubscriberError};
use crate::health::ConnectionHealth;
use crate::producers;
use crate::registry::{fan_out, Callback, ChannelRegistry, FanoutReport, SubscriberId};
use crate::scheduler::{Scheduler, TickHandler, TimerKind};

/// Read-only composite view for operational displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub running: bool,
    pub subscriber_count: usize,
    pub active_channels: Vec<ChannelName>,
    pub connection_status: ConnectionState,
}

/// Real-time channel broadcaster.
///
/// Cheap to clone; all clones share one instance.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

struct Inner {
    config: RealtimeConfig,
    settings: RwLock<Settings>,
    health: ConnectionHealth,
    registry: Mutex<ChannelRegistry>,
    scheduler: Scheduler,
    lifecycle: ReentrantMutex<()>,
}

impl Broadcaster {
    /// Create a broadcaster on the current tokio runtime.
    pub fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        let runtime = Handle::try_current().map_err(|_| RealtimeError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Create a broadcaster whose timers run on `runtime`.
    pub fn with_runtime(config: RealtimeConfig, runtime: Handle) -> RealtimeResult<Self> {
        config.validate()?;
        let settings = config.settings.clone();

        info!(
            alert_threshold = settings.alert_threshold,
            update_frequency_s = settings.update_frequency_seconds,
            real_time_updates = settings.real_time_updates_enabled,
            "Broadcaster created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                settings: RwLock::new(settings),
                health: ConnectionHealth::new(),
                registry: Mutex::new(ChannelRegistry::new()),
                scheduler: Scheduler::new(runtime),
                lifecycle: ReentrantMutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    /// Subscribe a closure to `channel`.
    ///
    /// The first subscription overall starts the scheduler.
    pub fn subscribe<F>(&self, channel: ChannelName, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ChannelPayload) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribe_callback(channel, Arc::new(callback))
    }

    /// Subscribe a shared callback. Registering the same `Arc` twice on one
    /// channel returns a handle to the existing subscription.
    pub fn subscribe_callback(&self, channel: ChannelName, callback: Callback) -> SubscriptionHandle {
        self.inner.subscribe(channel, callback)
    }

    /// Subscribe by channel name. Unknown names are logged and ignored.
    pub fn subscribe_named<F>(&self, channel: &str, callback: F) -> Option<SubscriptionHandle>
    where
        F: Fn(&ChannelPayload) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        match channel.parse::<ChannelName>() {
            Ok(channel) => Some(self.subscribe(channel, callback)),
            Err(e) => {
                warn!(error = %e, "Subscribe ignored");
                None
            }
        }
    }

    /// Produce and emit `channel` now, outside the timer cadence.
    pub fn trigger_update(&self, channel: ChannelName) -> FanoutReport {
        debug!(channel = %channel, "Manual update triggered");
        self.inner.publish(channel)
    }

    /// Trigger by channel name. Unknown names are logged and ignored.
    pub fn trigger_update_named(&self, channel: &str) -> Option<FanoutReport> {
        match channel.parse::<ChannelName>() {
            Ok(channel) => Some(self.trigger_update(channel)),
            Err(e) => {
                warn!(error = %e, "Trigger ignored");
                None
            }
        }
    }

    /// Refresh every data channel.
    pub fn refresh_all(&self) {
        for channel in [
            ChannelName::Alerts,
            ChannelName::Stats,
            ChannelName::Objects,
            ChannelName::Conjunctions,
        ] {
            self.trigger_update(channel);
        }
    }

    /// Validate and merge `update`, emit the new settings, and restart the
    /// timers if they are running.
    ///
    /// Nothing is applied when validation fails.
    pub fn update_settings(&self, update: SettingsUpdate) -> RealtimeResult<Settings> {
        self.inner.update_settings(&update)
    }

    /// Reset the connection and re-arm the timers.
    pub fn reconnect(&self) {
        self.inner.reconnect();
    }

    /// Drop every subscription and stop the timers.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    pub fn system_status(&self) -> SystemStatus {
        let (subscriber_count, active_channels) = {
            let registry = self.inner.registry.lock();
            (
                registry.subscriber_count(),
                registry.active_channels().into_iter().collect(),
            )
        };
        SystemStatus {
            running: self.is_running(),
            subscriber_count,
            active_channels,
            connection_status: self.inner.connection_snapshot(),
        }
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> Settings {
        self.inner.settings.read().clone()
    }

    /// Copy of the current connection state.
    pub fn connection_status(&self) -> ConnectionState {
        self.inner.connection_snapshot()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriber_count = self.inner.registry.lock().subscriber_count();
        f.debug_struct("Broadcaster")
            .field("running", &self.is_running())
            .field("subscriber_count", &subscriber_count)
            .field("connection", &self.inner.health.status())
            .finish()
    }
}

impl Inner {
    fn subscribe(self: &Arc<Self>, channel: ChannelName, callback: Callback) -> SubscriptionHandle {
        let _guard = self.lifecycle.lock();

        let (registration, count) = {
            let mut registry = self.registry.lock();
            let registration = registry.insert(channel, callback);
            (registration, registry.subscriber_count())
        };
        Metrics::subscribers(count);

        if registration.inserted {
            debug!(
                channel = %channel,
                subscriber = registration.id.value(),
                subscribers = count,
                "Subscriber added"
            );
        }
        if registration.became_active {
            self.start();
        }

        SubscriptionHandle {
            inner: Arc::downgrade(self),
            channel,
            id: registration.id,
            active: AtomicBool::new(true),
        }
    }

    fn unsubscribe(self: &Arc<Self>, channel: ChannelName, id: SubscriberId) {
        let _guard = self.lifecycle.lock();

        let (removal, count) = {
            let mut registry = self.registry.lock();
            let removal = registry.remove(channel, id);
            (removal, registry.subscriber_count())
        };
        if !removal.removed {
            return;
        }

        Metrics::subscribers(count);
        debug!(
            channel = %channel,
            subscriber = id.value(),
            subscribers = count,
            "Subscriber removed"
        );
        if removal.became_idle {
            self.stop();
        }
    }

    /// Arm the timers, mark the connection up and announce it.
    fn start(self: &Arc<Self>) {
        let plan = self.config.timer_plan(&self.settings.read());
        let handler: Weak<dyn TickHandler> = Arc::downgrade(self) as Weak<dyn TickHandler>;
        if !self.scheduler.start(&plan, handler) {
            return;
        }

        self.health.mark_connected();
        info!(timers = plan.len(), "Broadcaster started");
        self.emit(ChannelPayload::Connection(self.connection_snapshot()));
    }

    /// Cancel the timers and announce the disconnect.
    fn stop(&self) {
        if !self.scheduler.stop() {
            return;
        }

        self.health.mark_disconnected();
        info!("Broadcaster stopped");
        self.emit(ChannelPayload::Connection(self.connection_snapshot()));
    }

    fn restart(self: &Arc<Self>) {
        self.stop();
        self.start();
        Metrics::scheduler_restart();
    }

    fn update_settings(self: &Arc<Self>, update: &SettingsUpdate) -> RealtimeResult<Settings> {
        let _guard = self.lifecycle.lock();

        let next = {
            let current = self.settings.read();
            current.merged(update).map_err(|e| {
                warn!(error = %e, "Settings update rejected");
                RealtimeError::from(e)
            })?
        };
        *self.settings.write() = next.clone();

        info!(
            alert_threshold = next.alert_threshold,
            tracking_interval_s = next.tracking_interval_seconds,
            update_frequency_s = next.update_frequency_seconds,
            real_time_updates = next.real_time_updates_enabled,
            "Settings updated"
        );
        self.emit(ChannelPayload::Settings(next.clone()));

        if self.scheduler.is_running() {
            self.restart();
        }
        Ok(next)
    }

    fn reconnect(self: &Arc<Self>) {
        let _guard = self.lifecycle.lock();
        info!("Reconnect requested");

        self.stop();
        self.health.mark_connected();
        self.emit(ChannelPayload::Connection(self.connection_snapshot()));

        // Timers only run while someone is listening.
        if !self.registry.lock().is_empty() {
            self.start();
        }
    }

    fn shutdown(&self) {
        let _guard = self.lifecycle.lock();
        self.registry.lock().clear();
        Metrics::subscribers(0);
        self.stop();
        info!("Broadcaster shut down");
    }

    fn connection_snapshot(&self) -> ConnectionState {
        let mut state = self.health.snapshot();
        state.subscribed_channels = self.registry.lock().active_channels().into_iter().collect();
        state
    }

    fn produce(&self, channel: ChannelName) -> ChannelPayload {
        let settings = self.settings.read().clone();
        let now = Utc::now();
        let mut rng = rand::thread_rng();

        match channel {
            ChannelName::Objects => ChannelPayload::Objects(producers::produce_objects(&mut rng, now)),
            ChannelName::Alerts => {
                let alerts = producers::produce_alerts(&mut rng, &settings, now);
                for alert in &alerts {
                    Metrics::alert_emitted(alert.priority.as_str());
                }
                ChannelPayload::Alerts(alerts)
            }
            ChannelName::Conjunctions => {
                ChannelPayload::Conjunctions(producers::produce_conjunctions(&mut rng, now))
            }
            ChannelName::Stats => {
                ChannelPayload::Stats(producers::produce_stats(&mut rng, &settings, now))
            }
            ChannelName::Connection => ChannelPayload::Connection(self.connection_snapshot()),
            ChannelName::Settings => ChannelPayload::Settings(settings),
        }
    }

    /// Produce `channel` and fan it out.
    fn publish(&self, channel: ChannelName) -> FanoutReport {
        let payload = self.produce(channel);
        if channel.is_data() {
            self.health.record_message();
        }
        self.emit(payload)
    }

    fn emit(&self, payload: ChannelPayload) -> FanoutReport {
        let channel = payload.channel();
        let subscribers = self.registry.lock().snapshot(channel);

        Metrics::emission(channel.as_str());
        let report = fan_out(&subscribers, &payload);
        trace!(
            channel = %channel,
            delivered = report.delivered,
            failed = report.failed,
            "Emission complete"
        );
        report
    }

    fn heartbeat(&self) {
        if self.health.is_stale(self.config.heartbeat_stale_after()) {
            self.health.mark_error();
            self.emit(ChannelPayload::Connection(self.connection_snapshot()));
            return;
        }

        if self.health.record_heartbeat() {
            self.emit(ChannelPayload::Connection(self.connection_snapshot()));
        }
    }
}

impl TickHandler for Inner {
    fn on_tick(&self, timer: TimerKind) {
        match timer {
            TimerKind::Channel(channel) => {
                self.publish(channel);
            }
            TimerKind::Heartbeat => self.heartbeat(),
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle does not unsubscribe.
#[must_use = "the handle is the only way to unsubscribe"]
pub struct SubscriptionHandle {
    inner: Weak<Inner>,
    channel: ChannelName,
    id: SubscriberId,
    active: AtomicBool,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> ChannelName {
        self.channel
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// False once `unsubscribe` has been called on this handle.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Remove the subscription. Calling this more than once is a no-op.
    ///
    /// Removing the last subscription stops the scheduler.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.unsubscribe(self.channel, self.id);
        }
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
