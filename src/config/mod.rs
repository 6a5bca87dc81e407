//! Orchestrator configuration.
//!
//! Loaded from a TOML file or built from defaults; every field has a serde
//! default so a partial file is fine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Timeout applied to each individual connector call.
    #[serde(default = "default_per_call_timeout_secs")]
    pub per_call_timeout_secs: u64,

    /// Deadline for one whole tool call batch; pending calls past it are
    /// recorded as timeouts.
    #[serde(default = "default_batch_deadline_secs")]
    pub batch_deadline_secs: u64,

    /// Deadline for the whole task; expiry forces a failed terminal state.
    #[serde(default = "default_task_deadline_secs")]
    pub task_deadline_secs: u64,

    /// Concurrency ceiling for connector calls within one batch.
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Grace window added to the task deadline for refinement cache TTLs.
    #[serde(default = "default_cache_grace_secs")]
    pub cache_grace_secs: u64,

    /// Bound on each task's progress channel.
    #[serde(default = "default_progress_channel_capacity")]
    pub progress_channel_capacity: usize,

    /// How long a finished task remains queryable before eviction.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_per_call_timeout_secs() -> u64 {
    30
}

fn default_batch_deadline_secs() -> u64 {
    120
}

fn default_task_deadline_secs() -> u64 {
    600
}

fn default_max_concurrent_calls() -> usize {
    8
}

fn default_cache_grace_secs() -> u64 {
    60
}

fn default_progress_channel_capacity() -> usize {
    32
}

fn default_retention_secs() -> u64 {
    300
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            per_call_timeout_secs: default_per_call_timeout_secs(),
            batch_deadline_secs: default_batch_deadline_secs(),
            task_deadline_secs: default_task_deadline_secs(),
            max_concurrent_calls: default_max_concurrent_calls(),
            cache_grace_secs: default_cache_grace_secs(),
            progress_channel_capacity: default_progress_channel_capacity(),
            retention_secs: default_retention_secs(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Configuration(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| AppError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_calls == 0 {
            return Err(AppError::Configuration(
                "max_concurrent_calls must be at least 1".to_string(),
            ));
        }
        if self.per_call_timeout_secs > self.batch_deadline_secs {
            return Err(AppError::Configuration(
                "per_call_timeout_secs cannot exceed batch_deadline_secs".to_string(),
            ));
        }
        Ok(())
    }

    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_secs(self.per_call_timeout_secs)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_secs(self.batch_deadline_secs)
    }

    pub fn task_deadline(&self) -> Duration {
        Duration::from_secs(self.task_deadline_secs)
    }

    pub fn cache_grace(&self) -> Duration {
        Duration::from_secs(self.cache_grace_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_calls, 8);
        assert_eq!(config.per_call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: OrchestratorConfig =
            toml::from_str("max_concurrent_calls = 4\ntask_deadline_secs = 90\n").unwrap();
        assert_eq!(config.max_concurrent_calls, 4);
        assert_eq!(config.task_deadline_secs, 90);
        assert_eq!(config.batch_deadline_secs, default_batch_deadline_secs());
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let config = OrchestratorConfig {
            max_concurrent_calls: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            AppError::Configuration(_)
        ));
    }

    #[test]
    fn test_validation_rejects_inverted_timeouts() {
        let config = OrchestratorConfig {
            per_call_timeout_secs: 500,
            batch_deadline_secs: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
