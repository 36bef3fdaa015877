use claimsync_types::Address;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored under the requested address.
    #[error("content not found: {0}")]
    NotFound(Address),

    /// The backend could not be reached.
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    /// Empty payloads have no meaningful address.
    #[error("cannot store empty content")]
    EmptyContent,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
