//! Content-addressed storage for claimsync.
//!
//! The content store holds the canonical bytes of every claim. It never
//! interprets what it stores: `put` returns the address derived from the
//! bytes and `get` returns exactly those bytes again.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Content is immutable once written (content-addressing guarantees this).
//! 2. Writing the same bytes twice is a no-op returning the same address.
//! 3. A missing address is an error (`NotFound`), not an empty result.
//! 4. Timeouts and retries belong to the backend, not to callers.

pub mod error;
pub mod hasher;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
