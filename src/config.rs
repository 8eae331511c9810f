//! Engine configuration
//!
//! Timing constants for the interruption classifier and the chunk size used by
//! the timeline chunker. Values can be loaded from a JSON file; missing fields
//! fall back to the defaults below.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default duration of interest in milliseconds (T_I)
pub const DEFAULT_DURATION_OF_INTEREST_MS: i64 = 5000;

/// Default interruption lag in milliseconds (T_L)
pub const DEFAULT_INTERRUPTION_LAG_MS: i64 = 0;

/// Default resumption lag in milliseconds (T_R)
pub const DEFAULT_RESUMPTION_LAG_MS: i64 = 3000;

/// Default chunk size in seconds
pub const DEFAULT_CHUNK_SIZE: u32 = 5;

/// Timing constants used while classifying a session's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Duration of interest before an interruption (T_I).
    ///
    /// Part of the configuration contract; no stage reads it yet.
    pub duration_of_interest_ms: i64,
    /// Lead time before a blur during which gaze is considered contaminated (T_L)
    pub interruption_lag_ms: i64,
    /// Grace period after regaining focus before gaze is trusted again (T_R)
    pub resumption_lag_ms: i64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration_of_interest_ms: DEFAULT_DURATION_OF_INTEREST_MS,
            interruption_lag_ms: DEFAULT_INTERRUPTION_LAG_MS,
            resumption_lag_ms: DEFAULT_RESUMPTION_LAG_MS,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    /// Chunk length in seconds
    pub chunk_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, or the defaults when `path` does not exist.
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that all values are usable by the engine.
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.chunk_size == 0 {
            return Err(ComputeError::InvalidConfig(
                "chunk_size must be a positive number of seconds".to_string(),
            ));
        }
        if self.timing.interruption_lag_ms < 0 {
            return Err(ComputeError::InvalidConfig(
                "interruption_lag_ms must not be negative".to_string(),
            ));
        }
        if self.timing.resumption_lag_ms < 0 {
            return Err(ComputeError::InvalidConfig(
                "resumption_lag_ms must not be negative".to_string(),
            ));
        }
        if self.timing.duration_of_interest_ms < 0 {
            return Err(ComputeError::InvalidConfig(
                "duration_of_interest_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
