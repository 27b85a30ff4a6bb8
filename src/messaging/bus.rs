use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};
use parking_lot::{Mutex, RwLock};
/// Event bus for pub/sub messaging
///
/// Subscribers get their own channel. A subscription is a guard: dropping it
/// unsubscribes, so there is exactly one teardown path per subscriber.
use std::sync::{Arc, Weak};

use super::events::AudioEvent;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

/// Event subscriber
struct Subscriber {
    id: SubscriberId,
    sender: Sender<AudioEvent>,
}

struct BusInner {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: Mutex<usize>,
}

/// Event bus for broadcasting audio events to subscribers
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(Vec::new()),
                next_id: Mutex::new(0),
            }),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded();

        let mut next_id = self.inner.next_id.lock();
        let id = SubscriberId(*next_id);
        *next_id += 1;
        drop(next_id);

        self.inner
            .subscribers
            .write()
            .push(Subscriber { id, sender: tx });

        Subscription {
            id,
            receiver: rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    fn unsubscribe(inner: &BusInner, id: SubscriberId) {
        inner.subscribers.write().retain(|s| s.id != id);
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: AudioEvent) {
        let subscribers = self.inner.subscribers.read();

        for subscriber in subscribers.iter() {
            // A full or closed channel only means that subscriber went away
            let _ = subscriber.sender.try_send(event.clone());
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of a subscription. Unsubscribes on drop.
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<AudioEvent>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next pending event, if any
    pub fn try_recv(&self) -> Option<AudioEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain every pending event without blocking
    pub fn try_iter(&self) -> TryIter<'_, AudioEvent> {
        self.receiver.try_iter()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            EventBus::unsubscribe(&inner, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new();
        let _sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_publish() {
        let bus = EventBus::new();
        let sub = bus.subscribe();

        bus.publish(AudioEvent::Ready);

        match sub.try_recv() {
            Some(AudioEvent::Ready) => {}
            _ => panic!("Wrong event type received"),
        }
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new();
        let sub1 = bus.subscribe();
        let sub2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);
        assert_ne!(sub1.id(), sub2.id());

        bus.publish(AudioEvent::Ready);

        assert_eq!(sub1.pending(), 1);
        assert_eq!(sub2.try_iter().count(), 1);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        drop(bus);

        assert!(sub.try_recv().is_none());
        drop(sub);
    }

    #[test]
    fn test_event_bus_clone_shares_subscribers() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _sub = bus1.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
