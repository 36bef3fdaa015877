//! Selection rules for pending entries.
//!
//! An entry is eligible for a download attempt when every clause below holds.
//! Each clause is exposed on its own so stores that push the filter down to a
//! native query can be checked against the same definitions.

use std::time::Duration;

use claimsync_types::Timestamp;

use crate::entry::Entry;

/// Default backoff between attempts on the same entry (10 minutes).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(600_000);

/// Default inclusive attempt cap.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Backoff and attempt budget applied when selecting entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum time between two attempts on the same entry.
    pub retry_delay: Duration,
    /// Entries with `attempt_count <= max_attempts` remain selectable.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(retry_delay: Duration, max_attempts: u32) -> Self {
        Self {
            retry_delay,
            max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

/// The claim behind the entry is still unknown.
pub fn is_unresolved(entry: &Entry) -> bool {
    entry.claim_id.is_none()
}

/// Never attempted, or the last attempt is strictly older than
/// `now - retry_delay`.
pub fn retry_delay_elapsed(entry: &Entry, now: Timestamp, retry_delay: Duration) -> bool {
    match entry.last_attempt_at {
        None => true,
        Some(last) => now
            .checked_sub(retry_delay)
            .is_some_and(|cutoff| last < cutoff),
    }
}

/// No success has been recorded. Nothing writes `last_success_at` today, so
/// this always holds.
pub fn never_succeeded(entry: &Entry) -> bool {
    entry.last_success_at.is_none()
}

/// Inclusive cap: an entry at exactly `max_attempts` gets one more try.
pub fn within_attempt_cap(entry: &Entry, max_attempts: u32) -> bool {
    entry.attempt_count <= max_attempts
}

/// All selection clauses combined.
pub fn is_eligible(entry: &Entry, now: Timestamp, policy: &RetryPolicy) -> bool {
    is_unresolved(entry)
        && retry_delay_elapsed(entry, now, policy.retry_delay)
        && never_succeeded(entry)
        && within_attempt_cap(entry, policy.max_attempts)
}

/// Unresolved and past its attempt budget: will never be selected again.
pub fn is_exhausted(entry: &Entry, max_attempts: u32) -> bool {
    is_unresolved(entry) && !within_attempt_cap(entry, max_attempts)
}
