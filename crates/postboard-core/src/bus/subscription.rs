//! Subscription handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, Notify};

use super::event::{ChangeEvent, Topic};

/// State shared between a [`Subscription`] and its [`CancelHandle`]s.
///
/// The receiver lives here so that cancelling from any handle releases it
/// at once. While `next` is waiting it holds the receiver itself and drops
/// it on wake-up.
#[derive(Debug)]
struct Shared {
    id: u64,
    topic: Topic,
    cancelled: AtomicBool,
    notify: Notify,
    receiver: Mutex<Option<broadcast::Receiver<ChangeEvent>>>,
}

impl Shared {
    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
        self.release();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn release(&self) {
        if self.receiver.lock().take().is_some() {
            tracing::debug!(subscription_id = self.id, topic = %self.topic, "subscription released");
        }
    }

    /// Put back a receiver taken by `next`. Drops it instead if the
    /// subscription was cancelled meanwhile.
    fn restore(&self, receiver: broadcast::Receiver<ChangeEvent>) -> bool {
        let mut slot = self.receiver.lock();
        if self.is_cancelled() {
            tracing::debug!(subscription_id = self.id, topic = %self.topic, "subscription released");
            return false;
        }
        *slot = Some(receiver);
        true
    }
}

/// Cancels a [`Subscription`] from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    /// Cancel the subscription. Idempotent.
    ///
    /// The subscription stops counting as a subscriber before this returns;
    /// a pending [`Subscription::next`] returns `None` promptly.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }
}

/// A live registration against a topic.
///
/// Yields the events published on the topic after the subscription was
/// created, in publish order, until it is cancelled or dropped. At most
/// `capacity` unread events are kept; older ones are dropped.
#[derive(Debug)]
pub struct Subscription {
    shared: Arc<Shared>,
    capacity: usize,
    dropped: u64,
}

impl Subscription {
    pub(super) fn new(
        id: u64,
        topic: Topic,
        receiver: broadcast::Receiver<ChangeEvent>,
        capacity: usize,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                topic,
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                receiver: Mutex::new(Some(receiver)),
            }),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Unique subscription ID.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Topic this subscription listens on.
    pub fn topic(&self) -> &Topic {
        &self.shared.topic
    }

    /// Number of events lost because this subscriber fell behind.
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.is_cancelled()
    }

    /// Handle that cancels this subscription from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel the subscription and release its receiver. Idempotent.
    pub fn cancel(&mut self) {
        self.shared.cancel();
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription is cancelled or the bus is gone.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        let shared = Arc::clone(&self.shared);

        loop {
            let notified = shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if shared.is_cancelled() {
                shared.release();
                return None;
            }

            let mut receiver = shared.receiver.lock().take()?;
            self.trim_backlog(&mut receiver);

            let received = tokio::select! {
                biased;
                _ = &mut notified => None,
                result = receiver.recv() => Some(result),
            };

            match received {
                None => {
                    drop(receiver);
                    tracing::debug!(subscription_id = shared.id, topic = %shared.topic, "subscription released");
                    return None;
                }
                Some(Ok(event)) => {
                    let overflowing = receiver.len() >= self.capacity;
                    if !shared.restore(receiver) {
                        return None;
                    }
                    if overflowing {
                        self.record_lag(1);
                        continue;
                    }
                    self.record_delivery();
                    return Some(event);
                }
                Some(Err(RecvError::Lagged(skipped))) => {
                    self.record_lag(skipped);
                    if !shared.restore(receiver) {
                        return None;
                    }
                }
                Some(Err(RecvError::Closed)) => {
                    tracing::debug!(subscription_id = shared.id, topic = %shared.topic, "bus closed");
                    return None;
                }
            }
        }
    }

    /// Take the next buffered event without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        let shared = Arc::clone(&self.shared);
        if shared.is_cancelled() {
            shared.release();
            return None;
        }

        let mut slot = shared.receiver.lock();
        let receiver = slot.as_mut()?;
        self.trim_backlog(receiver);

        loop {
            match receiver.try_recv() {
                Ok(event) => {
                    self.record_delivery();
                    return Some(event);
                }
                Err(TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    *slot = None;
                    tracing::debug!(subscription_id = shared.id, topic = %shared.topic, "bus closed");
                    return None;
                }
            }
        }
    }

    /// Adapt into a stream that ends when the subscription is cancelled.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|event| (event, sub))
        })
    }

    /// Discard the oldest unread events beyond `capacity`.
    ///
    /// The broadcast ring is sized to a power of two, so it can hold more
    /// than the configured bound.
    fn trim_backlog(&mut self, receiver: &mut broadcast::Receiver<ChangeEvent>) {
        let mut skipped = 0;
        while receiver.len() > self.capacity {
            match receiver.try_recv() {
                Ok(_) => skipped += 1,
                Err(TryRecvError::Lagged(lost)) => skipped += lost,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if skipped > 0 {
            self.record_lag(skipped);
        }
    }

    fn record_delivery(&self) {
        tracing::trace!(subscription_id = self.shared.id, topic = %self.shared.topic, "event delivered");
    }

    fn record_lag(&mut self, skipped: u64) {
        self.dropped += skipped;
        tracing::warn!(
            subscription_id = self.shared.id,
            topic = %self.shared.topic,
            skipped,
            "subscriber fell behind, dropped oldest events"
        );
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.release();
    }
}
