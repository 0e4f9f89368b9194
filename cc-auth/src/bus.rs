//! Typed publish/subscribe channel for store notifications.
//!
//! Each subscriber gets its own unbounded queue, so delivery order per
//! subscriber is the publish order. Dropping a [`Subscription`] unsubscribes.

use std::sync::{Arc, Mutex, Weak};

use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::event::Notification;

/// Identifier of a bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, mpsc::UnboundedSender<Notification>)>,
}

/// Broadcast bus carrying [`Notification`]s.
///
/// Cheap to clone; all clones share the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
}

impl NotificationBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a notification to every subscriber. Returns the number of
    /// subscribers reached.
    pub fn publish(&self, notification: Notification) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };
        debug!(
            "NotificationBus: publishing {} to {} subscriber(s)",
            notification.name(),
            inner.subscribers.len()
        );
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
        inner.subscribers.len()
    }

    /// Subscribe to all notifications published from now on.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = match self.inner.lock() {
            Ok(mut inner) => {
                inner.next_id += 1;
                let id = SubscriptionId(inner.next_id);
                inner.subscribers.push((id, tx));
                id
            }
            // Poisoned bus: hand out a subscription that never receives.
            Err(_) => SubscriptionId(0),
        };
        trace!("NotificationBus: subscribed {:?}", id);
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.subscribers.len())
            .unwrap_or(0)
    }
}

/// Receiving end of a bus subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Notification>,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// Get the subscription id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Take the next queued notification without waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        match self.rx.try_recv() {
            Ok(notification) => Some(notification),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next notification. Returns `None` once the bus is gone
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade()
            && let Ok(mut inner) = bus.lock()
        {
            inner.subscribers.retain(|(id, _)| *id != self.id);
            trace!("NotificationBus: unsubscribed {:?}", self.id);
        }
    }
}
