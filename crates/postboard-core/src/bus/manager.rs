//! Topic registry and event publishing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::event::{ChangeEvent, Topic};
use super::subscription::Subscription;

/// Default number of unread events buffered per subscriber.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 256;

/// Topic-keyed publish/subscribe bus.
///
/// Each topic owns a broadcast channel, created lazily on first subscription.
/// Publishing never blocks: a subscriber that falls more than `capacity`
/// events behind loses its oldest unread events, without affecting the
/// publisher or other subscribers.
pub struct NotificationBus {
    /// Broadcast senders keyed by topic.
    channels: RwLock<HashMap<Topic, broadcast::Sender<ChangeEvent>>>,
    /// Per-subscriber buffer depth.
    capacity: usize,
    /// Next subscription ID.
    next_subscription_id: AtomicU64,
}

impl NotificationBus {
    /// Create a bus with the default subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// Per-subscriber buffer depth.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Subscribe to events published on `topic` from now on.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);

        let receiver = {
            let channels = self.channels.read();
            channels.get(&topic).map(broadcast::Sender::subscribe)
        };

        let receiver = match receiver {
            Some(receiver) => receiver,
            None => {
                let mut channels = self.channels.write();
                // Another subscriber may have created it in the meantime
                channels
                    .entry(topic.clone())
                    .or_insert_with(|| {
                        tracing::debug!(topic = %topic, capacity = self.capacity, "created topic channel");
                        broadcast::channel(self.capacity).0
                    })
                    .subscribe()
            }
        };

        tracing::debug!(subscription_id = id, topic = %topic, "subscription created");

        Subscription::new(id, topic, receiver, self.capacity)
    }

    /// Publish an event on `topic`.
    ///
    /// Returns the number of subscriptions the event was delivered to.
    pub fn publish(&self, topic: &Topic, event: ChangeEvent) -> usize {
        let delivered = {
            let channels = self.channels.read();
            match channels.get(topic) {
                Some(sender) => sender.send(event).ok(),
                None => return 0,
            }
        };

        match delivered {
            Some(count) => {
                tracing::trace!(topic = %topic, receivers = count, "published change event");
                count
            }
            None => {
                // Every receiver is gone
                self.remove_if_idle(topic);
                0
            }
        }
    }

    /// Publish an event on the topic it belongs to.
    pub fn publish_event(&self, event: ChangeEvent) -> usize {
        let topic = event.topic();
        self.publish(&topic, event)
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.channels
            .read()
            .get(topic)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Number of topics with a channel.
    pub fn topic_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Drop channels that no longer have subscribers.
    ///
    /// Returns the number of channels removed.
    pub fn prune(&self) -> usize {
        let mut channels = self.channels.write();
        let before = channels.len();
        channels.retain(|topic, sender| {
            let live = sender.receiver_count() > 0;
            if !live {
                tracing::debug!(topic = %topic, "removed idle topic channel");
            }
            live
        });
        before - channels.len()
    }

    fn remove_if_idle(&self, topic: &Topic) {
        let mut channels = self.channels.write();
        if channels
            .get(topic)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(topic);
            tracing::debug!(topic = %topic, "removed idle topic channel");
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared bus handle.
pub type SharedBus = Arc<NotificationBus>;
