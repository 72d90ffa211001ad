//! Channel registry and supervised fan-out.
//!
//! The registry maps each channel to its subscriber callbacks. It holds no
//! locks itself; the broadcaster guards it and only ever invokes callbacks on
//! a snapshot taken with the lock released, so callbacks may subscribe or
//! unsubscribe freely.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use orbit_core::{ChannelName, ChannelPayload};
use tracing::warn;

use crate::error::SubscriberError;

/// Subscriber callback.
///
/// Identity is the `Arc` allocation: registering the same `Arc` twice on one
/// channel is a no-op.
pub type Callback = Arc<dyn Fn(&ChannelPayload) -> Result<(), SubscriberError> + Send + Sync>;

/// Registry-assigned subscriber identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of registering a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub id: SubscriberId,
    /// False when the callback was already registered on this channel.
    pub inserted: bool,
    /// True when this registration moved the registry from empty to non-empty.
    pub became_active: bool,
}

/// Result of removing a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub removed: bool,
    /// True when this removal emptied the registry.
    pub became_idle: bool,
}

/// Channel → subscriber set.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<ChannelName, Vec<(SubscriberId, Callback)>>,
    next_id: u64,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` on `channel`.
    pub fn insert(&mut self, channel: ChannelName, callback: Callback) -> Registration {
        let was_empty = self.channels.is_empty();
        let subscribers = self.channels.entry(channel).or_default();

        if let Some((id, _)) = subscribers
            .iter()
            .find(|(_, existing)| same_callback(existing, &callback))
        {
            return Registration {
                id: *id,
                inserted: false,
                became_active: false,
            };
        }

        self.next_id += 1;
        let id = SubscriberId(self.next_id);
        subscribers.push((id, callback));

        Registration {
            id,
            inserted: true,
            became_active: was_empty,
        }
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub fn remove(&mut self, channel: ChannelName, id: SubscriberId) -> Removal {
        let Some(subscribers) = self.channels.get_mut(&channel) else {
            return Removal {
                removed: false,
                became_idle: false,
            };
        };

        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            self.channels.remove(&channel);
        }

        Removal {
            removed,
            became_idle: removed && self.channels.is_empty(),
        }
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Channels with at least one subscriber.
    pub fn active_channels(&self) -> BTreeSet<ChannelName> {
        self.channels.keys().copied().collect()
    }

    /// Total callbacks across all channels.
    pub fn subscriber_count(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: ChannelName, id: SubscriberId) -> bool {
        self.channels
            .get(&channel)
            .is_some_and(|subs| subs.iter().any(|(existing, _)| *existing == id))
    }

    /// Callbacks currently registered on `channel`.
    pub fn snapshot(&self, channel: ChannelName) -> Vec<Callback> {
        self.channels
            .get(&channel)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Outcome of one emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: usize,
}

impl FanoutReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Invoke every callback with `payload`.
///
/// Each callback runs in its own failure boundary: an error or a panic is
/// logged with the channel and delivery continues with the next subscriber.
pub fn fan_out(subscribers: &[Callback], payload: &ChannelPayload) -> FanoutReport {
    let channel = payload.channel();
    let mut report = FanoutReport::default();

    for callback in subscribers {
        let outcome = catch_unwind(AssertUnwindSafe(|| callback(payload)))
            .unwrap_or_else(|panic| Err(SubscriberError::new(panic_message(panic.as_ref()))));

        match outcome {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                orbit_telemetry::Metrics::subscriber_failed(channel.as_str());
                warn!(channel = %channel, error = %e, "Subscriber callback failed");
            }
        }
    }

    report
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string payload"
    };
    format!("callback panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_core::Settings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Callback {
        Arc::new(|_| Ok(()))
    }

    #[test]
    fn test_first_insert_activates() {
        let mut registry = ChannelRegistry::new();
        let first = registry.insert(ChannelName::Alerts, noop());
        assert!(first.inserted);
        assert!(first.became_active);

        let second = registry.insert(ChannelName::Stats, noop());
        assert!(second.inserted);
        assert!(!second.became_active);
        assert_ne!(first.id, second.id);

        assert_eq!(registry.subscriber_count(), 2);
        assert_eq!(
            registry.active_channels().into_iter().collect::<Vec<_>>(),
            vec![ChannelName::Alerts, ChannelName::Stats]
        );
    }

    #[test]
    fn test_same_callback_is_idempotent() {
        let mut registry = ChannelRegistry::new();
        let cb = noop();

        let first = registry.insert(ChannelName::Alerts, Arc::clone(&cb));
        let again = registry.insert(ChannelName::Alerts, Arc::clone(&cb));
        assert!(!again.inserted);
        assert_eq!(first.id, again.id);
        assert_eq!(registry.subscriber_count(), 1);

        // Same callback on another channel is a separate subscription
        let other = registry.insert(ChannelName::Objects, cb);
        assert!(other.inserted);
        assert_eq!(registry.subscriber_count(), 2);
    }

    #[test]
    fn test_remove_last_goes_idle() {
        let mut registry = ChannelRegistry::new();
        let a = registry.insert(ChannelName::Alerts, noop());
        let b = registry.insert(ChannelName::Alerts, noop());

        let removal = registry.remove(ChannelName::Alerts, a.id);
        assert!(removal.removed);
        assert!(!removal.became_idle);
        assert!(registry.active_channels().contains(&ChannelName::Alerts));

        let removal = registry.remove(ChannelName::Alerts, b.id);
        assert!(removal.removed);
        assert!(removal.became_idle);
        assert!(registry.is_empty());
        assert!(registry.active_channels().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ChannelRegistry::new();
        let a = registry.insert(ChannelName::Stats, noop());
        let _b = registry.insert(ChannelName::Objects, noop());

        assert!(registry.remove(ChannelName::Stats, a.id).removed);
        let again = registry.remove(ChannelName::Stats, a.id);
        assert!(!again.removed);
        assert!(!again.became_idle);
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_fan_out_isolates_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut subscribers: Vec<Callback> = Vec::new();
        for i in 0..5 {
            let calls = Arc::clone(&calls);
            subscribers.push(Arc::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if i % 2 == 0 {
                    Err(SubscriberError::new(format!("subscriber {i} failed")))
                } else {
                    Ok(())
                }
            }));
        }

        let report = fan_out(&subscribers, &ChannelPayload::Settings(Settings::default()));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(report.failed, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.attempted(), 5);
    }

    #[test]
    fn test_fan_out_survives_panicking_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let exploding: Callback =
            Arc::new(|_: &ChannelPayload| -> Result<(), SubscriberError> {
                panic!("render exploded")
            });
        let healthy: Callback = Arc::new(move |_: &ChannelPayload| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let opaque: Callback = Arc::new(|_: &ChannelPayload| -> Result<(), SubscriberError> {
            std::panic::panic_any(42_u8)
        });
        let subscribers = vec![exploding, healthy, opaque];

        let report = fan_out(&subscribers, &ChannelPayload::Settings(Settings::default()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 2);
    }

    #[test]
    fn test_panic_message_extraction() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(from_str.as_ref()), "callback panicked: boom");

        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(from_string.as_ref()), "callback panicked: bang");

        let opaque: Box<dyn Any + Send> = Box::new(7_i32);
        assert!(panic_message(opaque.as_ref()).contains("non-string"));
    }
}
