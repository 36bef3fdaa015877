//! Error types for the index crate.

use claimsync_types::{Address, ClaimId};

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No entry exists for the address.
    #[error("entry not found: {0}")]
    EntryNotFound(Address),

    /// The address is already resolved to a different claim.
    #[error("entry {address} already resolved to {existing}, refusing {incoming}")]
    Conflict {
        address: Address,
        existing: ClaimId,
        incoming: ClaimId,
    },

    /// The backing document index could not be reached.
    #[error("index unavailable: {0}")]
    Unavailable(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
