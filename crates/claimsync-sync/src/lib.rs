//! Claim synchronization engine.
//!
//! Reconciles a content-addressed store with the entry index:
//!
//! - **Write path** ([`ClaimSynchronizer::create`]): store a claim's canonical
//!   bytes, record its address as resolved, announce the address.
//! - **Read path** ([`ClaimSynchronizer::download_next_hash`]): pick one
//!   pending entry, count the attempt, fetch and validate the claim, record
//!   the resolution, announce it. Runs as a [`DownloadPipeline`] of stages
//!   that stops at the first failure.
//! - **Scheduling** ([`PollingScheduler`]): drives the read path on a fixed
//!   cadence.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod scheduler;
pub mod synchronizer;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use pipeline::{
    Collaborators, DownloadContext, DownloadOutcome, DownloadPipeline, DownloadReport,
    DownloadStage, StageDecision, StageResult,
};
pub use scheduler::PollingScheduler;
pub use synchronizer::ClaimSynchronizer;

#[cfg(test)]
pub(crate) mod testing;
