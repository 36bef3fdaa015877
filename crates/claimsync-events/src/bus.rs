use std::sync::RwLock;

use async_trait::async_trait;
use claimsync_types::Address;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::PublishResult;
use crate::event::{ClaimEvent, PublishedEvent, Topic};
use crate::traits::EventPublisher;

/// Filter for subscribing to a subset of published events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events on these topics are delivered.
    pub topics: Option<Vec<Topic>>,
    /// If set, only events about this address are delivered.
    pub address: Option<Address>,
}

impl EventFilter {
    /// Deliver everything on one topic.
    pub fn topic(topic: Topic) -> Self {
        Self {
            topics: Some(vec![topic]),
            address: None,
        }
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &PublishedEvent) -> bool {
        if let Some(ref topics) = self.topics {
            if !topics.contains(&event.topic) {
                return false;
            }
        }
        if let Some(ref address) = self.address {
            if event.payload.address() != address {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for published events.
pub type EventStream = broadcast::Receiver<PublishedEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<PublishedEvent>,
}

/// In-process message bus.
///
/// Keeps a history of everything published (useful for assertions and for
/// the CLI summary) and fans events out to filtered subscribers. Subscribers
/// whose receivers have been dropped are pruned on the next publish.
pub struct InMemoryEventBus {
    history: RwLock<Vec<PublishedEvent>>,
    subscribers: RwLock<Vec<Subscriber>>,
    channel_capacity: usize,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a bus whose per-subscriber channels hold `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            channel_capacity: capacity.max(1),
        }
    }

    /// Register a subscriber and return its receiver.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        let (sender, rx) = broadcast::channel(self.channel_capacity);
        self.subscribers
            .write()
            .expect("bus lock poisoned")
            .push(Subscriber { filter, sender });
        rx
    }

    /// Every event published so far, oldest first.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.history.read().expect("bus lock poisoned").clone()
    }

    /// Events published on `topic`, oldest first.
    pub fn published_on(&self, topic: Topic) -> Vec<PublishedEvent> {
        self.history
            .read()
            .expect("bus lock poisoned")
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("bus lock poisoned").len()
    }

    fn route(&self, event: &PublishedEvent) {
        let mut subs = self.subscribers.write().expect("bus lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                sub.sender.receiver_count() > 0
            }
        });
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("published", &self.history.read().map(|h| h.len()).unwrap_or(0))
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ClaimEvent) -> PublishResult<PublishedEvent> {
        let published = PublishedEvent::new(event);
        self.history
            .write()
            .expect("bus lock poisoned")
            .push(published.clone());
        self.route(&published);
        debug!(id = %published.id, topic = %published.topic, "event published");
        Ok(published)
    }
}
