use async_trait::async_trait;
use claimsync_types::{Address, ClaimId, Timestamp};

use crate::eligibility::RetryPolicy;
use crate::entry::{Entry, RegisterOutcome, WriteOutcome};
use crate::error::IndexResult;
use crate::status::IndexSummary;

/// Persistent record of address → resolution state.
///
/// Implementations sit in front of a document index. Every mutating method
/// must be a single atomic update in that index (an increment or an upsert),
/// never a read followed by a write: overlapping scheduler ticks may update the
/// same entry concurrently.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Insert one unresolved entry per address.
    ///
    /// Addresses that already have an entry are skipped, not reported as
    /// errors.
    async fn register_unresolved(&self, addresses: &[Address]) -> IndexResult<RegisterOutcome>;

    /// Select one entry satisfying [`is_eligible`](crate::eligibility::is_eligible).
    ///
    /// Which entry is returned among several eligible ones is up to the store.
    async fn find_next_pending(
        &self,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> IndexResult<Option<Entry>>;

    /// Set `last_attempt_at = now` and increment `attempt_count` by one.
    ///
    /// Returns the entry as it is after the update.
    async fn record_attempt(&self, address: &Address, now: Timestamp) -> IndexResult<Entry>;

    /// Upsert `claim_id` on the entry for `address`.
    ///
    /// Creates the entry if it does not exist. A claim id, once set, is never
    /// replaced: a different id fails with [`IndexError::Conflict`](crate::IndexError::Conflict).
    async fn record_resolution(
        &self,
        address: &Address,
        claim_id: &ClaimId,
    ) -> IndexResult<WriteOutcome>;

    /// Look up the entry for `address`.
    async fn get(&self, address: &Address) -> IndexResult<Option<Entry>>;

    /// Every entry, in the store's natural order.
    async fn entries(&self) -> IndexResult<Vec<Entry>>;

    /// Unresolved entries whose attempt count exceeds `max_attempts`.
    async fn find_exhausted(&self, max_attempts: u32) -> IndexResult<Vec<Entry>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| crate::eligibility::is_exhausted(e, max_attempts))
            .collect())
    }

    /// Counts of entries by state at `now`.
    async fn summary(&self, now: Timestamp, policy: &RetryPolicy) -> IndexResult<IndexSummary> {
        let entries = self.entries().await?;
        Ok(IndexSummary::from_entries(&entries, now, policy))
    }
}
