//! Index health reporting.
//!
//! Entries that exhaust their attempt budget drop out of selection for good.
//! Nothing else would ever notice them, so the summary counts them explicitly.

use claimsync_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::eligibility::{self, RetryPolicy};
use crate::entry::Entry;

/// Where an entry stands relative to the resolution pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    /// The claim behind the address is known.
    Resolved,
    /// Selectable on the next tick.
    Eligible,
    /// Waiting for its retry delay to elapse.
    BackingOff,
    /// Past its attempt budget; will never be selected again.
    Exhausted,
}

impl EntryState {
    /// Classify an entry at `now` under `policy`.
    pub fn classify(entry: &Entry, now: Timestamp, policy: &RetryPolicy) -> Self {
        if !eligibility::is_unresolved(entry) {
            Self::Resolved
        } else if eligibility::is_exhausted(entry, policy.max_attempts) {
            Self::Exhausted
        } else if eligibility::is_eligible(entry, now, policy) {
            Self::Eligible
        } else {
            Self::BackingOff
        }
    }
}

/// Counts of entries by [`EntryState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub total: usize,
    pub resolved: usize,
    pub eligible: usize,
    pub backing_off: usize,
    pub exhausted: usize,
}

impl IndexSummary {
    /// Build a summary over a set of entries.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a Entry>,
        now: Timestamp,
        policy: &RetryPolicy,
    ) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total += 1;
            match EntryState::classify(entry, now, policy) {
                EntryState::Resolved => summary.resolved += 1,
                EntryState::Eligible => summary.eligible += 1,
                EntryState::BackingOff => summary.backing_off += 1,
                EntryState::Exhausted => summary.exhausted += 1,
            }
        }
        summary
    }

    /// Entries not yet resolved, in any state.
    pub fn unresolved(&self) -> usize {
        self.total - self.resolved
    }

    /// Returns `true` if some entries can no longer be resolved.
    pub fn has_stuck_entries(&self) -> bool {
        self.exhausted > 0
    }
}
