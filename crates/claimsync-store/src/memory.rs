use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use claimsync_types::Address;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;
use crate::traits::ContentStore;

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Content is held behind a `RwLock`;
/// `Bytes` clones are reference-counted so reads never copy payloads.
pub struct InMemoryContentStore {
    hasher: ContentHasher,
    objects: RwLock<HashMap<Address, Bytes>>,
}

impl InMemoryContentStore {
    /// Create a new empty store addressing content with [`ContentHasher::CLAIM`].
    pub fn new() -> Self {
        Self::with_hasher(ContentHasher::CLAIM)
    }

    /// Create a new empty store with a custom hasher.
    pub fn with_hasher(hasher: ContentHasher) -> Self {
        Self {
            hasher,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// The address `data` would be stored under, without storing it.
    pub fn address_of(&self, data: &[u8]) -> Address {
        self.hasher.address(data)
    }

    /// Number of distinct payloads currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, data: Bytes) -> StoreResult<Address> {
        if data.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let address = self.hasher.address(&data);
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(address.clone()).or_insert(data);
        trace!(address = %address, "content stored");
        Ok(address)
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.clone()))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("domain", &self.hasher.domain())
            .field("object_count", &self.len())
            .finish()
    }
}
