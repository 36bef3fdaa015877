//! Foundation types for claimsync.
//!
//! Every other claimsync crate depends on `claimsync-types`.
//!
//! # Key Types
//!
//! - [`Address`]: Content-derived identifier returned by the content store
//! - [`Claim`]: Immutable signed record identified by [`ClaimId`]
//! - [`ClaimType`]: Classification of a claim (`Work`, `Identity`)
//! - [`Timestamp`]: Wall-clock milliseconds since the UNIX epoch

pub mod address;
pub mod claim;
pub mod error;
pub mod temporal;

pub use address::Address;
pub use claim::{Claim, ClaimId, ClaimType};
pub use error::TypeError;
pub use temporal::Timestamp;
