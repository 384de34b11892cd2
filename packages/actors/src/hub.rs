//! Fan-out of committed registrations to live admin subscribers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use school_core::SchoolEvent;
use tokio::sync::mpsc;

/// Handle identifying one live subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fan-out dispatcher for live admin events.
///
/// Each subscriber gets its own unbounded channel: events arrive in
/// publish order per subscriber, and a slow or closed subscriber never
/// delays the others. A failed send deregisters that subscriber.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::UnboundedSender<SchoolEvent>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new live connection.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::UnboundedReceiver<SchoolEvent>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().insert(id, tx);
        tracing::debug!("Subscriber {id} connected");
        (id, rx)
    }

    /// Remove a live connection.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            tracing::debug!("Subscriber {id} disconnected");
        }
    }

    /// Deliver `event` to every subscriber, dropping any whose receiver
    /// has gone away.
    pub fn publish(&self, event: &SchoolEvent) {
        tracing::debug!("Broadcasting event: {}", event.description());
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|id, tx| match tx.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Pruning closed subscriber {id}");
                false
            }
        });
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}
