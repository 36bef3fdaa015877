use async_trait::async_trait;
use bytes::Bytes;
use claimsync_types::Address;

use crate::error::StoreResult;

/// Content-addressed byte store.
///
/// All implementations must satisfy these invariants:
/// - `put` returns the address derived from the bytes; the same bytes always
///   produce the same address and re-putting them is a no-op.
/// - `get` returns exactly the bytes that were stored, or
///   [`StoreError::NotFound`](crate::StoreError::NotFound) when the address is
///   unknown.
/// - Network or backend failures are returned as errors, never swallowed.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their content address.
    async fn put(&self, data: Bytes) -> StoreResult<Address>;

    /// Fetch the bytes stored under `address`.
    async fn get(&self, address: &Address) -> StoreResult<Bytes>;
}
