use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use claimsync_events::{ClaimEvent, EventPublisher, PublishedEvent};
use claimsync_index::{eligibility, Entry, EntryStore, RetryPolicy, WriteOutcome};
use claimsync_store::ContentStore;
use claimsync_types::{Address, Claim, ClaimId, Timestamp};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// The external systems the synchronizer talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub entries: Arc<dyn EntryStore>,
    pub content: Arc<dyn ContentStore>,
    pub events: Arc<dyn EventPublisher>,
}

// ---------------------------------------------------------------------------
// DownloadContext
// ---------------------------------------------------------------------------

/// State accumulated by the stages of one download.
///
/// Each stage reads what earlier stages left behind and adds its own output.
#[derive(Clone, Debug)]
pub struct DownloadContext {
    /// Clock reading used for selection and for the attempt timestamp.
    pub now: Timestamp,
    pub policy: RetryPolicy,
    /// The selected entry; after the attempt is recorded, its updated form.
    pub entry: Option<Entry>,
    pub claim: Option<Claim>,
    pub resolution: Option<WriteOutcome>,
    pub announcement: Option<PublishedEvent>,
}

impl DownloadContext {
    pub fn new(now: Timestamp, policy: RetryPolicy) -> Self {
        Self {
            now,
            policy,
            entry: None,
            claim: None,
            resolution: None,
            announcement: None,
        }
    }

    fn entry(&self, stage: &'static str) -> SyncResult<&Entry> {
        self.entry.as_ref().ok_or(SyncError::MissingContext {
            stage,
            missing: "an entry",
        })
    }

    fn claim(&self, stage: &'static str) -> SyncResult<&Claim> {
        self.claim.as_ref().ok_or(SyncError::MissingContext {
            stage,
            missing: "a claim",
        })
    }
}

// ---------------------------------------------------------------------------
// Stage contract
// ---------------------------------------------------------------------------

/// What a stage tells the driver after running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// Proceed to the next stage.
    Continue,
    /// Nothing to do this tick; stop without error.
    Stop,
}

/// Recorded result from a completed stage.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: &'static str,
    pub passed: bool,
    pub elapsed: Duration,
}

/// A single step of the download pipeline.
#[async_trait]
pub trait DownloadStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision>;
}

// ---------------------------------------------------------------------------
// Built-in stages
// ---------------------------------------------------------------------------

/// Select one eligible entry.
pub struct FindStage;

#[async_trait]
impl DownloadStage for FindStage {
    fn name(&self) -> &'static str {
        "find"
    }

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision> {
        match deps.entries.find_next_pending(ctx.now, &ctx.policy).await? {
            Some(entry) => {
                debug!(address = %entry.address, attempts = entry.attempt_count, "entry selected");
                ctx.entry = Some(entry);
                Ok(StageDecision::Continue)
            }
            None => Ok(StageDecision::Stop),
        }
    }
}

/// Count the attempt before any download I/O happens.
pub struct RecordAttemptStage;

#[async_trait]
impl DownloadStage for RecordAttemptStage {
    fn name(&self) -> &'static str {
        "record-attempt"
    }

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision> {
        let address = ctx.entry(self.name())?.address.clone();
        let updated = deps.entries.record_attempt(&address, ctx.now).await?;
        ctx.entry = Some(updated);
        Ok(StageDecision::Continue)
    }
}

/// Fetch the bytes behind the address and check they form a claim.
pub struct FetchStage;

#[async_trait]
impl DownloadStage for FetchStage {
    fn name(&self) -> &'static str {
        "fetch"
    }

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision> {
        let address = &ctx.entry(self.name())?.address;
        let bytes = deps.content.get(address).await?;
        let claim = Claim::from_slice(&bytes)?;
        ctx.claim = Some(claim);
        Ok(StageDecision::Continue)
    }
}

/// Record the claim id against the address.
pub struct ResolveStage;

#[async_trait]
impl DownloadStage for ResolveStage {
    fn name(&self) -> &'static str {
        "resolve"
    }

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision> {
        let address = ctx.entry(self.name())?.address.clone();
        let claim_id = ctx.claim(self.name())?.id.clone();
        let outcome = record_resolution(deps, &address, &claim_id).await?;
        ctx.resolution = Some(outcome);
        Ok(StageDecision::Continue)
    }
}

/// Announce the resolved claim.
pub struct AnnounceStage;

#[async_trait]
impl DownloadStage for AnnounceStage {
    fn name(&self) -> &'static str {
        "announce"
    }

    async fn run(
        &self,
        deps: &Collaborators,
        ctx: &mut DownloadContext,
    ) -> SyncResult<StageDecision> {
        let address = ctx.entry(self.name())?.address.clone();
        let claim = ctx.claim(self.name())?.clone();
        let published = deps
            .events
            .publish(ClaimEvent::Resolved { claim, address })
            .await?;
        ctx.announcement = Some(published);
        Ok(StageDecision::Continue)
    }
}

/// Upsert a resolution and flag writes that touched nothing.
///
/// A zero-document write means the index disagrees with itself; it is worth
/// an error log but not worth failing the caller over.
pub(crate) async fn record_resolution(
    deps: &Collaborators,
    address: &Address,
    claim_id: &ClaimId,
) -> SyncResult<WriteOutcome> {
    let outcome = deps.entries.record_resolution(address, claim_id).await?;
    if outcome.affected() == 0 {
        error!(
            address = %address,
            claim_id = %claim_id,
            ?outcome,
            "resolution write affected no documents"
        );
    }
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How one download run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// No entry was eligible.
    Idle,
    /// The entry was resolved and announced.
    Resolved {
        address: Address,
        claim_id: ClaimId,
        attempt_count: u32,
    },
    /// A stage failed; the remaining stages were skipped.
    Failed {
        stage: &'static str,
        address: Option<Address>,
        reason: String,
        /// The failed attempt used up the entry's last allowed try.
        exhausted: bool,
    },
}

impl DownloadOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// The outcome of one pipeline run plus per-stage timings.
#[derive(Clone, Debug)]
pub struct DownloadReport {
    pub outcome: DownloadOutcome,
    pub stage_results: Vec<StageResult>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// DownloadPipeline
// ---------------------------------------------------------------------------

/// Ordered list of stages run for each download.
///
/// The pipeline is **fail-fast**: the first stage that errors ends the run and
/// the error is reported in the [`DownloadReport`] instead of being returned.
pub struct DownloadPipeline {
    stages: Vec<Box<dyn DownloadStage>>,
}

impl DownloadPipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Find -> RecordAttempt -> Fetch -> Resolve -> Announce
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(Box::new(FindStage));
        pipeline.add_stage(Box::new(RecordAttemptStage));
        pipeline.add_stage(Box::new(FetchStage));
        pipeline.add_stage(Box::new(ResolveStage));
        pipeline.add_stage(Box::new(AnnounceStage));
        pipeline
    }

    pub fn add_stage(&mut self, stage: Box<dyn DownloadStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order against a fresh context.
    pub async fn run(
        &self,
        deps: &Collaborators,
        now: Timestamp,
        policy: RetryPolicy,
    ) -> DownloadReport {
        let pipeline_start = Instant::now();
        let mut ctx = DownloadContext::new(now, policy);
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let result = stage.run(deps, &mut ctx).await;
            stage_results.push(StageResult {
                stage_name: stage.name(),
                passed: result.is_ok(),
                elapsed: stage_start.elapsed(),
            });

            match result {
                Ok(StageDecision::Continue) => {}
                Ok(StageDecision::Stop) => {
                    debug!(stage = stage.name(), "no downloadable entries");
                    return DownloadReport {
                        outcome: DownloadOutcome::Idle,
                        stage_results,
                        elapsed: pipeline_start.elapsed(),
                    };
                }
                Err(err) => {
                    return DownloadReport {
                        outcome: failed(stage.name(), &ctx, err),
                        stage_results,
                        elapsed: pipeline_start.elapsed(),
                    };
                }
            }
        }

        DownloadReport {
            outcome: completed(&ctx),
            stage_results,
            elapsed: pipeline_start.elapsed(),
        }
    }
}

impl Default for DownloadPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

fn failed(stage: &'static str, ctx: &DownloadContext, err: SyncError) -> DownloadOutcome {
    let address = ctx.entry.as_ref().map(|e| e.address.clone());
    let exhausted = ctx
        .entry
        .as_ref()
        .is_some_and(|e| eligibility::is_exhausted(e, ctx.policy.max_attempts));

    match &address {
        Some(address) => info!(stage, address = %address, error = %err, "failed to download claim"),
        None => info!(stage, error = %err, "download run failed before selecting an entry"),
    }
    if exhausted {
        if let Some(entry) = &ctx.entry {
            warn!(
                address = %entry.address,
                attempts = entry.attempt_count,
                max_attempts = ctx.policy.max_attempts,
                "entry exhausted its attempt budget and will not be selected again"
            );
        }
    }

    DownloadOutcome::Failed {
        stage,
        address,
        reason: err.to_string(),
        exhausted,
    }
}

fn completed(ctx: &DownloadContext) -> DownloadOutcome {
    match (&ctx.entry, &ctx.claim) {
        (Some(entry), Some(claim)) => {
            info!(address = %entry.address, claim_id = %claim.id, "claim downloaded");
            DownloadOutcome::Resolved {
                address: entry.address.clone(),
                claim_id: claim.id.clone(),
                attempt_count: entry.attempt_count,
            }
        }
        // A custom pipeline may end without resolving anything.
        _ => DownloadOutcome::Idle,
    }
}
