//! Shared fixtures for the sync tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use claimsync_events::{ClaimEvent, EventPublisher, InMemoryEventBus, PublishError, PublishResult, PublishedEvent};
use claimsync_index::{
    Entry, EntryStore, InMemoryEntryStore, IndexResult, RegisterOutcome, RetryPolicy, WriteOutcome,
};
use claimsync_store::{ContentStore, InMemoryContentStore, StoreError, StoreResult};
use claimsync_types::{Address, Claim, ClaimId, ClaimType, Timestamp};

use crate::pipeline::Collaborators;
use crate::synchronizer::ClaimSynchronizer;

pub(crate) fn sample_claim(id: &str) -> Claim {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), format!("work {id}"));
    Claim {
        id: ClaimId::new(id),
        claim_type: ClaimType::Work,
        public_key: "02db393ae2d5".into(),
        signature: "3045022100".into(),
        date_created: Utc.with_ymd_and_hms(2017, 11, 2, 12, 0, 0).unwrap(),
        attributes,
    }
}

/// In-memory collaborators with typed handles kept for assertions.
pub(crate) struct Harness {
    pub entries: Arc<InMemoryEntryStore>,
    pub content: Arc<InMemoryContentStore>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(InMemoryEntryStore::new()),
            content: Arc::new(InMemoryContentStore::new()),
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    pub fn deps(&self) -> Collaborators {
        Collaborators {
            entries: self.entries.clone(),
            content: self.content.clone(),
            events: self.bus.clone(),
        }
    }

    pub fn synchronizer(&self) -> ClaimSynchronizer {
        ClaimSynchronizer::new(self.entries.clone(), self.content.clone(), self.bus.clone())
    }

    /// Store a claim directly, as another node would, without touching the index.
    pub async fn publish_elsewhere(&self, claim: &Claim) -> Address {
        let bytes = claim.to_canonical_bytes().unwrap();
        self.content.put(Bytes::from(bytes)).await.unwrap()
    }

    /// Store arbitrary bytes directly.
    pub async fn put_raw(&self, raw: &[u8]) -> Address {
        self.content.put(Bytes::copy_from_slice(raw)).await.unwrap()
    }
}

/// Content store that is always unreachable.
pub(crate) struct UnreachableStore;

#[async_trait]
impl ContentStore for UnreachableStore {
    async fn put(&self, _data: Bytes) -> StoreResult<Address> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _address: &Address) -> StoreResult<Bytes> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Publisher that rejects every event.
pub(crate) struct RejectingPublisher;

#[async_trait]
impl EventPublisher for RejectingPublisher {
    async fn publish(&self, _event: ClaimEvent) -> PublishResult<PublishedEvent> {
        Err(PublishError::Unavailable("broker down".into()))
    }
}

/// Content store whose reads take `delay` before answering.
pub(crate) struct SlowStore {
    pub inner: Arc<InMemoryContentStore>,
    pub delay: Duration,
}

#[async_trait]
impl ContentStore for SlowStore {
    async fn put(&self, data: Bytes) -> StoreResult<Address> {
        self.inner.put(data).await
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(address).await
    }
}

/// Entry index whose resolution writes match nothing, as a document index
/// does when the filter and the stored document disagree.
pub(crate) struct UnmatchedResolutionIndex {
    pub inner: InMemoryEntryStore,
}

#[async_trait]
impl EntryStore for UnmatchedResolutionIndex {
    async fn register_unresolved(&self, addresses: &[Address]) -> IndexResult<RegisterOutcome> {
        self.inner.register_unresolved(addresses).await
    }

    async fn find_next_pending(
        &self,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> IndexResult<Option<Entry>> {
        self.inner.find_next_pending(now, policy).await
    }

    async fn record_attempt(&self, address: &Address, now: Timestamp) -> IndexResult<Entry> {
        self.inner.record_attempt(address, now).await
    }

    async fn record_resolution(
        &self,
        _address: &Address,
        _claim_id: &ClaimId,
    ) -> IndexResult<WriteOutcome> {
        Ok(WriteOutcome::default())
    }

    async fn get(&self, address: &Address) -> IndexResult<Option<Entry>> {
        self.inner.get(address).await
    }

    async fn entries(&self) -> IndexResult<Vec<Entry>> {
        self.inner.entries().await
    }
}
