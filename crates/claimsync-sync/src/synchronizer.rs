use std::sync::Arc;

use bytes::Bytes;
use claimsync_events::{ClaimEvent, EventPublisher};
use claimsync_index::{Entry, EntryStore, IndexSummary, RegisterOutcome, RetryPolicy};
use claimsync_store::ContentStore;
use claimsync_types::{Address, Claim, Timestamp};
use tracing::{debug, info, instrument};

use crate::error::SyncResult;
use crate::pipeline::{record_resolution, Collaborators, DownloadOutcome, DownloadPipeline};

/// Keeps the content store and the entry index in agreement.
///
/// Owns the write path ([`create`](Self::create)) and the read path
/// ([`download_next_hash`](Self::download_next_hash)). Holds no state of its
/// own beyond its collaborators, so it can be shared behind an `Arc`.
pub struct ClaimSynchronizer {
    deps: Collaborators,
    pipeline: DownloadPipeline,
}

impl ClaimSynchronizer {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        content: Arc<dyn ContentStore>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            deps: Collaborators {
                entries,
                content,
                events,
            },
            pipeline: DownloadPipeline::standard(),
        }
    }

    /// Store a claim and record it as resolved.
    ///
    /// The claim is expected to have been validated by the caller. Every
    /// collaborator failure is returned; nothing is rolled back.
    #[instrument(skip_all, fields(claim_id = %claim.id))]
    pub async fn create(&self, claim: &Claim) -> SyncResult<Address> {
        let bytes = claim.to_canonical_bytes()?;
        let address = self.deps.content.put(Bytes::from(bytes)).await?;
        debug!(address = %address, "claim stored");

        record_resolution(&self.deps, &address, &claim.id).await?;

        self.deps
            .events
            .publish(ClaimEvent::AddressKnown {
                claim_id: claim.id.clone(),
                address: address.clone(),
            })
            .await?;

        info!(address = %address, "claim created");
        Ok(address)
    }

    /// Record newly discovered addresses as unresolved entries.
    #[instrument(skip_all, fields(count = addresses.len()))]
    pub async fn register_addresses(&self, addresses: &[Address]) -> SyncResult<RegisterOutcome> {
        let outcome = self.deps.entries.register_unresolved(addresses).await?;
        info!(
            inserted = outcome.inserted,
            ignored = outcome.ignored,
            "addresses registered"
        );
        Ok(outcome)
    }

    /// Try to resolve one pending entry using the current clock.
    pub async fn download_next_hash(&self, policy: &RetryPolicy) -> DownloadOutcome {
        self.download_next_hash_at(Timestamp::now(), policy).await
    }

    /// Try to resolve one pending entry as of `now`.
    ///
    /// Failures are logged and reported in the outcome, never returned.
    #[instrument(skip_all, fields(now = %now))]
    pub async fn download_next_hash_at(&self, now: Timestamp, policy: &RetryPolicy) -> DownloadOutcome {
        let report = self.pipeline.run(&self.deps, now, *policy).await;
        debug!(
            stages = report.stage_results.len(),
            elapsed_us = report.elapsed.as_micros() as u64,
            "download pipeline finished"
        );
        report.outcome
    }

    /// Unresolved entries that will never be selected again under `policy`.
    pub async fn stuck_entries(&self, policy: &RetryPolicy) -> SyncResult<Vec<Entry>> {
        Ok(self.deps.entries.find_exhausted(policy.max_attempts).await?)
    }

    pub async fn summary(&self, policy: &RetryPolicy) -> SyncResult<IndexSummary> {
        Ok(self.deps.entries.summary(Timestamp::now(), policy).await?)
    }
}

impl std::fmt::Debug for ClaimSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimSynchronizer")
            .field("stages", &self.pipeline.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::testing::{
        sample_claim, Harness, RejectingPublisher, UnmatchedResolutionIndex, UnreachableStore,
    };
    use claimsync_events::Topic;
    use claimsync_index::InMemoryEntryStore;
    use claimsync_store::InMemoryContentStore;
    use std::time::Duration;

    const MINUTE: u64 = 60_000;

    fn default_policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(600_000), 20)
    }

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[tokio::test]
    async fn create_then_lookup_returns_claim_id() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let claim = sample_claim("c1");

        let address = sync.create(&claim).await.unwrap();

        let entry = h.entries.get(&address).await.unwrap().unwrap();
        assert_eq!(entry.claim_id, Some(claim.id.clone()));
        assert_eq!(entry.attempt_count, 0);

        let stored = h.content.get(&address).await.unwrap();
        assert_eq!(Claim::from_slice(&stored).unwrap(), claim);

        let known = h.bus.published_on(Topic::ClaimAddressKnown);
        assert_eq!(known.len(), 1);
        assert_eq!(
            known[0].payload,
            ClaimEvent::AddressKnown {
                claim_id: claim.id.clone(),
                address: address.clone(),
            }
        );
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let claim = sample_claim("c1");

        let first = sync.create(&claim).await.unwrap();
        let second = sync.create(&claim).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.entries.len(), 1);
    }

    #[tokio::test]
    async fn create_resolves_previously_registered_address() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let claim = sample_claim("c1");
        let address = h.publish_elsewhere(&claim).await;
        sync.register_addresses(&[address.clone()]).await.unwrap();

        sync.create(&claim).await.unwrap();

        let entry = h.entries.get(&address).await.unwrap().unwrap();
        assert!(entry.is_resolved());
        assert!(sync.download_next_hash_at(at(1), &default_policy()).await.is_idle());
    }

    #[tokio::test]
    async fn create_propagates_store_failure() {
        let h = Harness::new();
        let sync = ClaimSynchronizer::new(h.entries.clone(), Arc::new(UnreachableStore), h.bus.clone());

        let err = sync.create(&sample_claim("c1")).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
        assert!(h.entries.is_empty());
        assert!(h.bus.published().is_empty());
    }

    #[tokio::test]
    async fn create_propagates_publish_failure_after_persisting() {
        let entries = Arc::new(InMemoryEntryStore::new());
        let sync = ClaimSynchronizer::new(
            entries.clone(),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(RejectingPublisher),
        );

        let err = sync.create(&sample_claim("c1")).await.unwrap_err();
        assert!(matches!(err, SyncError::Publish(_)));
        // No rollback: the resolution stays recorded.
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn register_reports_duplicates() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let a = Address::new("h1").unwrap();
        let b = Address::new("h2").unwrap();

        let first = sync.register_addresses(&[a.clone(), b.clone()]).await.unwrap();
        assert_eq!(first.inserted, 2);

        let second = sync.register_addresses(&[a, b]).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.ignored, 2);
    }

    #[tokio::test]
    async fn resolves_good_hash_and_backs_off_bad_one() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let claim = sample_claim("c1");
        let h1 = h.publish_elsewhere(&claim).await;
        let h2 = Address::new("QmUnreachable").unwrap();
        sync.register_addresses(&[h1.clone(), h2.clone()]).await.unwrap();

        let policy = default_policy();
        let t0 = 1_000_000;
        let mut outcomes = Vec::new();
        for tick in 0..3 {
            outcomes.push(sync.download_next_hash_at(at(t0 + tick * 5_000), &policy).await);
        }

        assert_eq!(outcomes.iter().filter(|o| o.is_resolved()).count(), 1);
        assert_eq!(outcomes.iter().filter(|o| o.is_failed()).count(), 1);
        assert!(outcomes[2].is_idle());

        let e1 = h.entries.get(&h1).await.unwrap().unwrap();
        assert_eq!(e1.claim_id, Some(claim.id.clone()));
        assert_eq!(e1.attempt_count, 1);

        let e2 = h.entries.get(&h2).await.unwrap().unwrap();
        assert!(!e2.is_resolved());
        assert_eq!(e2.attempt_count, 1);

        let resolved = h.bus.published_on(Topic::ClaimResolved);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].payload.address(), &h1);
    }

    #[tokio::test]
    async fn failed_entry_retried_after_delay() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let bad = Address::new("QmUnreachable").unwrap();
        sync.register_addresses(&[bad.clone()]).await.unwrap();
        let policy = default_policy();

        assert!(sync.download_next_hash_at(at(0), &policy).await.is_failed());
        assert!(sync.download_next_hash_at(at(10 * MINUTE), &policy).await.is_idle());
        assert!(sync.download_next_hash_at(at(10 * MINUTE + 1), &policy).await.is_failed());

        let entry = h.entries.get(&bad).await.unwrap().unwrap();
        assert_eq!(entry.attempt_count, 2);
        assert_eq!(entry.last_attempt_at, Some(at(10 * MINUTE + 1)));
    }

    #[tokio::test]
    async fn malformed_bytes_count_attempt_without_resolving() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let address = h.put_raw(br#"{"id":"x","type":"Work"}"#).await;
        sync.register_addresses(&[address.clone()]).await.unwrap();

        let outcome = sync.download_next_hash_at(at(1), &default_policy()).await;
        match outcome {
            DownloadOutcome::Failed { stage, address: failed, .. } => {
                assert_eq!(stage, "fetch");
                assert_eq!(failed, Some(address.clone()));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let entry = h.entries.get(&address).await.unwrap().unwrap();
        assert_eq!(entry.attempt_count, 1);
        assert!(!entry.is_resolved());
        assert!(h.bus.published_on(Topic::ClaimResolved).is_empty());
    }

    #[tokio::test]
    async fn claim_missing_signature_is_rejected() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let mut claim = sample_claim("c1");
        claim.signature = String::new();
        let address = h.publish_elsewhere(&claim).await;
        sync.register_addresses(&[address.clone()]).await.unwrap();

        let outcome = sync.download_next_hash_at(at(1), &default_policy()).await;
        match outcome {
            DownloadOutcome::Failed { reason, .. } => assert!(reason.contains("signature")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn attempt_cap_is_inclusive() {
        let h = Harness::new();
        let sync = h.synchronizer();
        let at_cap = Address::new("at-cap").unwrap();
        let over_cap = Address::new("over-cap").unwrap();
        h.entries.insert(Entry {
            attempt_count: 3,
            ..Entry::unresolved(at_cap.clone())
        });
        h.entries.insert(Entry {
            attempt_count: 4,
            ..Entry::unresolved(over_cap.clone())
        });
        let policy = RetryPolicy::new(Duration::ZERO, 3);

        match sync.download_next_hash_at(at(1), &policy).await {
            DownloadOutcome::Failed { address, exhausted, .. } => {
                assert_eq!(address, Some(at_cap.clone()));
                assert!(exhausted);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(sync.download_next_hash_at(at(2), &policy).await.is_idle());

        let stuck = sync.stuck_entries(&policy).await.unwrap();
        let stuck: Vec<_> = stuck.into_iter().map(|e| e.address).collect();
        assert_eq!(stuck, vec![at_cap, over_cap]);

        let summary = sync.summary(&policy).await.unwrap();
        assert_eq!(summary.exhausted, 2);
        assert!(summary.has_stuck_entries());
    }

    #[tokio::test]
    async fn empty_index_is_idle() {
        let h = Harness::new();
        let sync = h.synchronizer();
        assert_eq!(
            sync.download_next_hash(&default_policy()).await,
            DownloadOutcome::Idle
        );
    }

    #[tokio::test]
    async fn unmatched_resolution_write_is_not_an_error() {
        let h = Harness::new();
        let index = Arc::new(UnmatchedResolutionIndex {
            inner: InMemoryEntryStore::new(),
        });
        let sync = ClaimSynchronizer::new(index.clone(), h.content.clone(), h.bus.clone());

        let claim = sample_claim("c1");
        let address = h.publish_elsewhere(&claim).await;
        sync.register_addresses(&[address.clone()]).await.unwrap();

        let outcome = sync.download_next_hash_at(at(1), &default_policy()).await;
        assert_eq!(
            outcome,
            DownloadOutcome::Resolved {
                address: address.clone(),
                claim_id: claim.id.clone(),
                attempt_count: 1,
            }
        );
        assert_eq!(h.bus.published_on(Topic::ClaimResolved).len(), 1);

        let created = sync.create(&sample_claim("c2")).await.unwrap();
        assert_eq!(h.bus.published_on(Topic::ClaimAddressKnown).len(), 1);
        assert!(index.get(&created).await.unwrap().is_none());
    }
}
