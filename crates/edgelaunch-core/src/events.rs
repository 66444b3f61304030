//! Typed broadcast bus and the adapters that turn broadcasts into
//! controller triggers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use edgelaunch_types::{BroadcastKind, Orientation, SystemBroadcast};
use tracing::{debug, error};

use crate::controller::OverlayController;

type Handler = Arc<dyn Fn(&SystemBroadcast) + Send + Sync>;

struct Registration {
    generation: u64,
    kinds: Vec<BroadcastKind>,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_generation: AtomicU64,
    subscribers: Mutex<HashMap<String, Registration>>,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Broadcast bus with keyed subscriptions.
///
/// Subscribing again under the same key replaces the earlier handler, so a
/// receiver is never registered twice.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        key: &str,
        kinds: &[BroadcastKind],
        handler: impl Fn(&SystemBroadcast) + Send + Sync + 'static,
    ) -> Subscription {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = self.inner.subscribers().insert(
            key.to_string(),
            Registration {
                generation,
                kinds: kinds.to_vec(),
                handler: Arc::new(handler),
            },
        );
        if replaced.is_some() {
            debug!("Replaced subscription {key}");
        }

        Subscription {
            bus: Arc::downgrade(&self.inner),
            key: key.to_string(),
            generation,
        }
    }

    /// Deliver `broadcast` to every matching subscriber. Handlers run outside
    /// the bus lock, so they may subscribe or unsubscribe.
    pub fn publish(&self, broadcast: &SystemBroadcast) -> usize {
        let kind = broadcast.kind();
        let handlers: Vec<Handler> = self
            .inner
            .subscribers()
            .values()
            .filter(|r| r.kinds.contains(&kind))
            .map(|r| Arc::clone(&r.handler))
            .collect();

        for handler in &handlers {
            handler(broadcast);
        }
        handlers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<BusInner>,
    key: String,
    generation: u64,
}

impl Subscription {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut subscribers = bus.subscribers();
        // A newer subscription under the same key is not ours to remove
        if !subscribers
            .get(&self.key)
            .is_some_and(|r| r.generation == self.generation)
        {
            return;
        }
        let removed = subscribers.remove(&self.key);
        drop(subscribers);
        drop(removed);
        debug!("Unsubscribed {}", self.key);
    }
}

/// Screen on/off broadcasts.
pub struct ScreenStateAdapter {
    controller: Arc<OverlayController>,
}

impl ScreenStateAdapter {
    pub const KEY: &'static str = "screen-state";

    #[must_use]
    pub fn new(controller: Arc<OverlayController>) -> Self {
        Self { controller }
    }

    pub fn on_broadcast(&self, broadcast: &SystemBroadcast) {
        let result = match broadcast {
            SystemBroadcast::ScreenOff => self.controller.screen_off(),
            SystemBroadcast::ScreenOn => self.controller.screen_on(),
            SystemBroadcast::ConfigurationChanged { .. } => return,
        };
        if let Err(e) = result {
            error!("Screen state handling failed: {e}");
        }
    }

    pub fn subscribe(self, bus: &EventBus) -> Subscription {
        bus.subscribe(Self::KEY, &[BroadcastKind::Screen], move |b| {
            self.on_broadcast(b);
        })
    }
}

/// Configuration broadcasts, forwarded only when the orientation changed.
pub struct OrientationAdapter {
    controller: Arc<OverlayController>,
    last: Mutex<Orientation>,
}

impl OrientationAdapter {
    pub const KEY: &'static str = "orientation";

    #[must_use]
    pub fn new(controller: Arc<OverlayController>, current: Orientation) -> Self {
        Self {
            controller,
            last: Mutex::new(current),
        }
    }

    pub fn on_broadcast(&self, broadcast: &SystemBroadcast) {
        let SystemBroadcast::ConfigurationChanged { orientation } = *broadcast else {
            return;
        };
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == orientation {
                return;
            }
            *last = orientation;
        }

        debug!("Orientation changed to {orientation:?}");
        if let Err(e) = self.controller.orientation_changed() {
            error!("Orientation change handling failed: {e}");
        }
    }

    pub fn subscribe(self, bus: &EventBus) -> Subscription {
        bus.subscribe(Self::KEY, &[BroadcastKind::Configuration], move |b| {
            self.on_broadcast(b);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(bus: &EventBus, key: &str, kinds: &[BroadcastKind]) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sub = bus.subscribe(key, kinds, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[test]
    fn test_publish_filters_by_kind() {
        let bus = EventBus::new();
        let (screen, _s1) = counter(&bus, "screen", &[BroadcastKind::Screen]);
        let (config, _s2) = counter(&bus, "config", &[BroadcastKind::Configuration]);

        assert_eq!(bus.publish(&SystemBroadcast::ScreenOff), 1);
        assert_eq!(screen.load(Ordering::SeqCst), 1);
        assert_eq!(config.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let (count, sub) = counter(&bus, "screen", &[BroadcastKind::Screen]);
        drop(sub);

        assert_eq!(bus.publish(&SystemBroadcast::ScreenOn), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_resubscribe_replaces_handler() {
        let bus = EventBus::new();
        let (first, old) = counter(&bus, "screen", &[BroadcastKind::Screen]);
        let (second, _new) = counter(&bus, "screen", &[BroadcastKind::Screen]);

        bus.publish(&SystemBroadcast::ScreenOn);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        // Dropping the stale guard must not remove the replacement
        drop(old);
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(&SystemBroadcast::ScreenOn);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let (_count, sub) = counter(&bus, "screen", &[BroadcastKind::Screen]);
        drop(bus);
        assert_eq!(sub.key(), "screen");
        drop(sub);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_publish() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let inner_slot = Arc::clone(&slot);
        let sub = bus.subscribe("once", &[BroadcastKind::Screen], move |_| {
            inner_slot.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        assert_eq!(bus.publish(&SystemBroadcast::ScreenOff), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
