use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use log::{debug, trace};
use tokio::sync::mpsc::{self, error::TrySendError};

use super::relay_model::{RelayMessage, SubscriberId};
use crate::constants::RELAY_SUBSCRIBER_BUFFER;
use crate::events::{DomainEventSink, DonationEvent};

#[derive(Default)]
struct RelayInner {
    subscribers: DashMap<SubscriberId, mpsc::Sender<RelayMessage>>,
    next_id: AtomicU64,
}

/// Fan-out hub for donation events. Cheap to clone; clones share subscribers.
///
/// Delivery is best-effort and in memory only. Each subscriber queues at most
/// [`RELAY_SUBSCRIBER_BUFFER`] messages; a subscriber that falls behind misses
/// the overflow. A subscriber that has gone away is pruned on the next publish
/// and never causes an error.
#[derive(Clone, Default)]
pub struct DonationRelay {
    inner: Arc<RelayInner>,
}

impl DonationRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection. It stays registered until the
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(RELAY_SUBSCRIBER_BUFFER);
        self.inner.subscribers.insert(id, sender);
        debug!("Relay subscriber {} connected", id);
        Subscription {
            id,
            receiver,
            relay: Arc::downgrade(&self.inner),
        }
    }

    /// Sends `updateAvailable` with `event` to every subscriber except `origin`.
    ///
    /// Returns how many subscribers the message was queued for.
    pub fn publish(&self, origin: Option<SubscriberId>, event: DonationEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for entry in self.inner.subscribers.iter() {
            if Some(*entry.key()) == origin {
                continue;
            }
            match entry
                .value()
                .try_send(RelayMessage::UpdateAvailable(event.clone()))
            {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("Relay subscriber {} is behind, dropping update", entry.key());
                }
                Err(TrySendError::Closed(_)) => dead.push(*entry.key()),
            }
        }
        // Removal must wait until the iterator has released its shard locks.
        for id in dead {
            self.inner.subscribers.remove(&id);
            debug!("Relay subscriber {} pruned", id);
        }
        trace!("Relayed {:?} to {} subscriber(s)", event, delivered);
        delivered
    }

    /// Handles a message received from subscriber `origin`.
    pub fn handle_message(&self, origin: SubscriberId, message: RelayMessage) -> usize {
        match message {
            RelayMessage::DonationOccur(event) => self.publish(Some(origin), event),
            RelayMessage::UpdateAvailable(_) => {
                debug!("Ignoring updateAvailable sent by subscriber {}", origin);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl DomainEventSink for DonationRelay {
    fn emit(&self, event: DonationEvent) {
        self.publish(None, event);
    }
}

/// One live relay connection. Unregisters itself when dropped.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::Receiver<RelayMessage>,
    relay: Weak<RelayInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next message. `None` once the relay itself is gone.
    pub async fn recv(&mut self) -> Option<RelayMessage> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RelayMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.relay.upgrade() {
            inner.subscribers.remove(&self.id);
            debug!("Relay subscriber {} disconnected", self.id);
        }
    }
}
