//! Machine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or checking a [`MachineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse machine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("result_channel_capacity must be greater than zero")]
    ZeroChannelCapacity,

    #[error("max_metadata_attempts must be greater than zero when set")]
    ZeroMetadataAttempts,
}

/// Tunables for one state machine.
///
/// Every field has a default, so an empty JSON object is a valid config:
///
/// ```rust
/// use experience_engine::config::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{ "dismiss_timeout_ms": 5000 }"#).unwrap();
/// assert_eq!(config.dismiss_timeout(), Some(std::time::Duration::from_secs(5)));
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Give up waiting for the UI to resume a dismiss after this long and
    /// continue anyway. Unset means wait indefinitely.
    #[serde(default)]
    pub dismiss_timeout_ms: Option<u64>,

    /// Ceiling on metadata production passes for one step, retries included.
    /// Unset means retry for as long as traits ask to.
    #[serde(default)]
    pub max_metadata_attempts: Option<u32>,

    /// Transitions kept in the machine's history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Buffered results per subscriber before slow subscribers lag
    #[serde(default = "default_result_channel_capacity")]
    pub result_channel_capacity: usize,
}

fn default_history_limit() -> usize {
    64
}

fn default_result_channel_capacity() -> usize {
    64
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            dismiss_timeout_ms: None,
            max_metadata_attempts: None,
            history_limit: default_history_limit(),
            result_channel_capacity: default_result_channel_capacity(),
        }
    }
}

impl MachineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.result_channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        if self.max_metadata_attempts == Some(0) {
            return Err(ConfigError::ZeroMetadataAttempts);
        }
        Ok(())
    }

    pub fn dismiss_timeout(&self) -> Option<Duration> {
        self.dismiss_timeout_ms.map(Duration::from_millis)
    }
}
