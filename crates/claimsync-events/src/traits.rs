use async_trait::async_trait;

use crate::error::PublishResult;
use crate::event::{ClaimEvent, PublishedEvent};

/// Thin contract over a message bus.
///
/// The topic is derived from the payload ([`ClaimEvent::topic`]). Delivery is
/// at-least-once; implementations return once the bus has accepted the
/// message and never wait for consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event and return the envelope that went out.
    async fn publish(&self, event: ClaimEvent) -> PublishResult<PublishedEvent>;
}
