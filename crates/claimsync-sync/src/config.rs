use std::path::Path;
use std::time::Duration;

use claimsync_index::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Settings for the resolution scheduler.
///
/// Loaded from TOML; keys that are absent keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between scheduler ticks.
    pub download_interval_secs: u64,
    /// Minutes an entry waits after an attempt before it is selectable again.
    pub download_retry_delay_minutes: u64,
    /// Inclusive cap on attempts per entry.
    pub download_max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            download_interval_secs: 5,
            download_retry_delay_minutes: 10,
            download_max_attempts: 20,
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> SyncResult<String> {
        toml::to_string(self).map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.download_interval_secs == 0 {
            return Err(SyncError::Config(
                "download_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn download_interval(&self) -> Duration {
        Duration::from_secs(self.download_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.download_retry_delay_minutes.saturating_mul(60))
    }

    /// The policy passed to every scheduled download.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay(), self.download_max_attempts)
    }
}
