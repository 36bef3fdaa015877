//! `BTreeMap`-backed entry store.
//!
//! Natural order is ascending address, so among several eligible entries the
//! lowest address is selected. Every mutation happens under one write-lock
//! acquisition, which gives the same atomicity a document index offers for a
//! single `updateOne`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use claimsync_types::{Address, ClaimId, Timestamp};
use tracing::{debug, error};

use crate::eligibility::{self, RetryPolicy};
use crate::entry::{Entry, RegisterOutcome, WriteOutcome};
use crate::error::{IndexError, IndexResult};
use crate::traits::EntryStore;

/// In-memory entry index for tests and embedding.
pub struct InMemoryEntryStore {
    entries: RwLock<BTreeMap<Address, Entry>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Insert or replace an entry verbatim. Intended for seeding test fixtures.
    pub fn insert(&self, entry: Entry) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(entry.address.clone(), entry);
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryEntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEntryStore")
            .field("entries", &self.len())
            .finish()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn register_unresolved(&self, addresses: &[Address]) -> IndexResult<RegisterOutcome> {
        let mut map = self.entries.write().expect("lock poisoned");
        let mut outcome = RegisterOutcome::default();
        for address in addresses {
            if map.contains_key(address) {
                outcome.ignored += 1;
                continue;
            }
            map.insert(address.clone(), Entry::unresolved(address.clone()));
            outcome.inserted += 1;
        }
        debug!(
            inserted = outcome.inserted,
            ignored = outcome.ignored,
            "registered addresses"
        );
        Ok(outcome)
    }

    async fn find_next_pending(
        &self,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> IndexResult<Option<Entry>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .values()
            .find(|e| eligibility::is_eligible(e, now, policy))
            .cloned())
    }

    async fn record_attempt(&self, address: &Address, now: Timestamp) -> IndexResult<Entry> {
        let mut map = self.entries.write().expect("lock poisoned");
        let entry = map
            .get_mut(address)
            .ok_or_else(|| IndexError::EntryNotFound(address.clone()))?;
        entry.last_attempt_at = Some(now);
        entry.attempt_count = entry.attempt_count.saturating_add(1);
        Ok(entry.clone())
    }

    async fn record_resolution(
        &self,
        address: &Address,
        claim_id: &ClaimId,
    ) -> IndexResult<WriteOutcome> {
        let mut map = self.entries.write().expect("lock poisoned");
        match map.get_mut(address) {
            Some(entry) => {
                let modified = match &entry.claim_id {
                    None => {
                        entry.claim_id = Some(claim_id.clone());
                        1
                    }
                    Some(existing) if existing == claim_id => 0,
                    Some(existing) => {
                        error!(
                            address = %address,
                            existing = %existing,
                            incoming = %claim_id,
                            "address already resolved to a different claim"
                        );
                        return Err(IndexError::Conflict {
                            address: address.clone(),
                            existing: existing.clone(),
                            incoming: claim_id.clone(),
                        });
                    }
                };
                Ok(WriteOutcome {
                    matched: 1,
                    modified,
                    upserted: false,
                })
            }
            None => {
                map.insert(
                    address.clone(),
                    Entry::resolved(address.clone(), claim_id.clone()),
                );
                Ok(WriteOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                })
            }
        }
    }

    async fn get(&self, address: &Address) -> IndexResult<Option<Entry>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(address).cloned())
    }

    async fn entries(&self) -> IndexResult<Vec<Entry>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.values().cloned().collect())
    }
}
