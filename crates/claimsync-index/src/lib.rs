//! Entry index for claimsync.
//!
//! Keeps one [`Entry`] per content address ever seen, recording whether the
//! claim behind it has been resolved and how many download attempts it has
//! consumed. The index is an append-only ledger: entries are mutated in place
//! and never deleted.
//!
//! # Key Types
//!
//! - [`EntryStore`] -- The storage contract (insert, select, update-with-upsert)
//! - [`InMemoryEntryStore`] -- `BTreeMap`-backed implementation
//! - [`Entry`] -- Per-address resolution and retry record
//! - [`RetryPolicy`] -- Backoff delay and inclusive attempt cap
//! - [`IndexSummary`] -- Counts by resolution state, including stuck entries

pub mod eligibility;
pub mod entry;
pub mod error;
pub mod memory;
pub mod status;
pub mod traits;

pub use eligibility::RetryPolicy;
pub use entry::{Entry, RegisterOutcome, WriteOutcome};
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryEntryStore;
pub use status::{EntryState, IndexSummary};
pub use traits::EntryStore;
