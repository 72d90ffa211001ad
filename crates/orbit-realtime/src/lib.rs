//! Real-time channel broadcaster for Orbital Guardian.
//!
//! Simulates a live space-tracking feed: timer-driven producers emit objects,
//! alerts, conjunctions and stats to callbacks subscribed per channel, while a
//! heartbeat keeps a connection-health model current.
//!
//! - `Broadcaster`: Subscription, manual triggers, settings and reconnect
//! - `ChannelRegistry` / `fan_out`: Per-channel callbacks with failure isolation
//! - `Scheduler`: Recurring timers, armed iff anyone is subscribed
//! - `ConnectionHealth`: Status, heartbeat, latency and message counters
//! - `producers`: Randomized payload generation

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod health;
pub mod producers;
pub mod registry;
pub mod scheduler;

pub use broadcaster::{Broadcaster, SubscriptionHandle, SystemStatus};
pub use config::RealtimeConfig;
pub use error::{RealtimeError, RealtimeResult, SubscriberError};
pub use health::ConnectionHealth;
pub use registry::{fan_out, Callback, ChannelRegistry, FanoutReport, SubscriberId};
pub use scheduler::{Scheduler, TickHandler, TimerKind};
