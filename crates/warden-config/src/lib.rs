//! Engine configuration.
//!
//! Supports configuration via environment variables:
//!
//! ```bash
//! WARDEN_AUDIT_ENABLED=true            # record every decision (default: true)
//! WARDEN_REGEX_MAX_PATTERN_LEN=512     # longest accepted `regex` condition pattern
//! WARDEN_REGEX_SIZE_LIMIT=1048576      # compiled program size limit in bytes
//! ```
//!
//! or a JSON file with the same keys in camelCase. Unset keys fall back to the
//! defaults above.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_REGEX_MAX_PATTERN_LEN: usize = 512;
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// Configuration for the authorization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Whether guard decisions are handed to the audit log
    pub audit_enabled: bool,
    /// Patterns longer than this evaluate to `false` without compiling
    pub regex_max_pattern_len: usize,
    /// Upper bound on the compiled size of a condition pattern
    pub regex_size_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            regex_max_pattern_len: DEFAULT_REGEX_MAX_PATTERN_LEN,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid boolean for {0}: {1}")]
    InvalidBool(String, String),

    #[error("Invalid number for {0}: {1}")]
    InvalidNumber(String, String),

    #[error("{0} must be greater than zero")]
    Zero(String),

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&contents)?;
        config.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(enabled) = read_bool("WARDEN_AUDIT_ENABLED")? {
            self.audit_enabled = enabled;
        }
        if let Some(len) = read_usize("WARDEN_REGEX_MAX_PATTERN_LEN")? {
            self.regex_max_pattern_len = len;
        }
        if let Some(limit) = read_usize("WARDEN_REGEX_SIZE_LIMIT")? {
            self.regex_size_limit = limit;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.regex_max_pattern_len == 0 {
            return Err(ConfigError::Zero("regexMaxPatternLen".to_string()));
        }
        if self.regex_size_limit == 0 {
            return Err(ConfigError::Zero("regexSizeLimit".to_string()));
        }
        Ok(())
    }
}

fn read_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => match v.to_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidBool(key.to_string(), v)),
        },
        Err(_) => Ok(None),
    }
}

fn read_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(v) => v
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(key.to_string(), v)),
        Err(_) => Ok(None),
    }
}
