// SPDX-FileCopyrightText: 2026 ChatBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live-update fan-out to connected subscribers.
//!
//! Each subscriber owns a bounded channel. A broadcast delivers to every
//! subscriber in turn, waiting at most `subscriber_timeout` on each; any
//! subscriber that is closed or stays full past the timeout is removed. One
//! slow subscriber therefore delays a broadcast by a bounded amount and
//! never stops delivery to the others.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use chatbridge_config::model::BroadcastConfig;
use chatbridge_core::types::LiveEvent;

type Subscribers = Arc<DashMap<Uuid, mpsc::Sender<String>>>;

/// Registry of live subscribers.
#[derive(Clone)]
pub struct Broadcaster {
    subscribers: Subscribers,
    subscriber_timeout: Duration,
    buffer: usize,
}

/// A registered subscriber's receiving end. Unsubscribes on drop.
pub struct Subscription {
    guard: SubscriptionGuard,
    receiver: mpsc::Receiver<String>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.guard.id
    }

    /// Next serialized event, or `None` once this subscriber was dropped
    /// from the registry.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Split into the registration guard and the raw receiver.
    pub fn into_parts(self) -> (SubscriptionGuard, mpsc::Receiver<String>) {
        (self.guard, self.receiver)
    }
}

/// Removes a subscriber registration when dropped.
pub struct SubscriptionGuard {
    id: Uuid,
    subscribers: Subscribers,
}

impl SubscriptionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscribers.remove(&self.id);
    }
}

impl Broadcaster {
    pub fn new(config: &BroadcastConfig) -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            subscriber_timeout: Duration::from_millis(config.subscriber_timeout_ms),
            buffer: config.subscriber_buffer.max(1),
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();
        self.subscribers.insert(id, tx);
        debug!(subscriber = %id, "subscriber added");
        Subscription {
            guard: SubscriptionGuard {
                id,
                subscribers: self.subscribers.clone(),
            },
            receiver,
        }
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: Uuid) {
        if self.subscribers.remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber removed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Serialize `event` and deliver it to every subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn broadcast(&self, event: &LiveEvent) -> usize {
        match serde_json::to_string(event) {
            Ok(payload) => self.broadcast_raw(payload).await,
            Err(e) => {
                warn!(error = %e, "failed to serialize live event");
                0
            }
        }
    }

    /// Deliver an already serialized payload to every subscriber.
    pub async fn broadcast_raw(&self, payload: String) -> usize {
        // Snapshot so no map shard lock is held across an await.
        let targets: Vec<(Uuid, mpsc::Sender<String>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.send_timeout(payload.clone(), self.subscriber_timeout).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(subscriber = %id, error = %e, "dropping subscriber after failed delivery");
                    self.subscribers.remove(&id);
                }
            }
        }
        delivered
    }
}
