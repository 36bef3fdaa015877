//! Periodic driver for the read path.
//!
//! The timer loop runs in its own task and spawns one task per tick, so a slow
//! download never delays the next tick. Ticks may therefore overlap; the
//! entry index keeps per-entry updates atomic. Stopping the scheduler ends the
//! timer loop but lets ticks that already started run to completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use claimsync_index::RetryPolicy;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::synchronizer::ClaimSynchronizer;

enum SchedulerState {
    Idle,
    Running {
        shutdown: watch::Sender<bool>,
        timer: JoinHandle<()>,
    },
}

/// Invokes [`ClaimSynchronizer::download_next_hash`] on a fixed interval.
pub struct PollingScheduler {
    synchronizer: Arc<ClaimSynchronizer>,
    interval: Duration,
    policy: RetryPolicy,
    ticks: Arc<AtomicU64>,
    state: Mutex<SchedulerState>,
}

impl PollingScheduler {
    /// Fails if `interval` is zero or too large to schedule from now.
    pub fn new(
        synchronizer: Arc<ClaimSynchronizer>,
        interval: Duration,
        policy: RetryPolicy,
    ) -> SyncResult<Self> {
        if interval.is_zero() {
            return Err(SyncError::Config("scheduler interval must be non-zero".into()));
        }
        if Instant::now().checked_add(interval.saturating_mul(2)).is_none() {
            return Err(SyncError::Config(format!(
                "scheduler interval {interval:?} is out of range"
            )));
        }
        Ok(Self {
            synchronizer,
            interval,
            policy,
            ticks: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(SchedulerState::Idle),
        })
    }

    /// Build a scheduler with the interval and retry policy from `config`.
    pub fn from_config(synchronizer: Arc<ClaimSynchronizer>, config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Self::new(synchronizer, config.download_interval(), config.retry_policy())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of ticks dispatched since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().expect("lock poisoned"),
            SchedulerState::Running { .. }
        )
    }

    /// Arm the timer. Returns `false` if it was already running, or if the
    /// first tick cannot be scheduled.
    ///
    /// The first tick fires one interval after this call. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        if matches!(*state, SchedulerState::Running { .. }) {
            return false;
        }
        let Some(first_tick) = Instant::now().checked_add(self.interval) else {
            error!(interval = ?self.interval, "first tick is out of range; scheduler not started");
            return false;
        };

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let synchronizer = self.synchronizer.clone();
        let policy = self.policy;
        let period = self.interval;
        let ticks = self.ticks.clone();

        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let tick = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                        let synchronizer = synchronizer.clone();
                        tokio::spawn(async move {
                            let outcome = synchronizer.download_next_hash(&policy).await;
                            debug!(tick, ?outcome, "tick finished");
                        });
                    }
                }
            }
        });

        *state = SchedulerState::Running { shutdown, timer };
        info!(interval_secs = period.as_secs_f64(), "scheduler started");
        true
    }

    /// Disarm the timer. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let previous = std::mem::replace(
            &mut *self.state.lock().expect("lock poisoned"),
            SchedulerState::Idle,
        );
        match previous {
            SchedulerState::Idle => false,
            SchedulerState::Running { shutdown, timer } => {
                let _ = shutdown.send(true);
                timer.abort();
                info!(ticks = self.ticks(), "scheduler stopped");
                true
            }
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("interval", &self.interval)
            .field("policy", &self.policy)
            .field("running", &self.is_running())
            .field("ticks", &self.ticks())
            .finish()
    }
}
