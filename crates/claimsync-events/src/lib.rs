//! Event publishing for claimsync.
//!
//! The synchronizer announces two things on the message bus: that a claim
//! has been stored under an address, and that a previously unknown address
//! has been resolved into a claim. Delivery is at-least-once and nothing in
//! the core waits for acknowledgements.

pub mod bus;
pub mod error;
pub mod event;
pub mod traits;

pub use bus::{EventFilter, EventStream, InMemoryEventBus};
pub use error::{PublishError, PublishResult};
pub use event::{ClaimEvent, EventId, PublishedEvent, Topic};
pub use traits::EventPublisher;
