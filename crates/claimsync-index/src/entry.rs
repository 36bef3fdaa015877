//! Index entry types.

use claimsync_types::{Address, ClaimId, Timestamp};
use serde::{Deserialize, Serialize};

/// Resolution and retry bookkeeping for one content address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Identity key. Never changes once the entry exists.
    pub address: Address,
    /// Set once the claim behind `address` is known; `None` means unresolved.
    pub claim_id: Option<ClaimId>,
    /// When the last download attempt started.
    pub last_attempt_at: Option<Timestamp>,
    /// Part of the selection filter but never written by any code path.
    pub last_success_at: Option<Timestamp>,
    /// Attempts made so far, successful or not.
    pub attempt_count: u32,
}

impl Entry {
    /// A freshly discovered address with every resolution field at its default.
    pub fn unresolved(address: Address) -> Self {
        Self {
            address,
            claim_id: None,
            last_attempt_at: None,
            last_success_at: None,
            attempt_count: 0,
        }
    }

    /// An entry whose claim is already known (the write path).
    pub fn resolved(address: Address, claim_id: ClaimId) -> Self {
        Self {
            claim_id: Some(claim_id),
            ..Self::unresolved(address)
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.claim_id.is_some()
    }
}

/// Result of a bulk registration of discovered addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// Entries created by this call.
    pub inserted: usize,
    /// Addresses skipped because an entry already existed.
    pub ignored: usize,
}

/// Result of an update-with-upsert, in document-index terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Existing documents matched by the filter.
    pub matched: u64,
    /// Matched documents whose contents changed.
    pub modified: u64,
    /// Whether a new document was created.
    pub upserted: bool,
}

impl WriteOutcome {
    /// Documents the write touched; zero signals an index inconsistency.
    pub fn affected(&self) -> u64 {
        self.matched + u64::from(self.upserted)
    }
}
