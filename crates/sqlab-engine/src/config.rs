//! Engine configuration

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Handling of submissions that contain several statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiStatementPolicy {
    /// Run every statement in order, surface the first result set
    #[default]
    FirstResult,
    /// Refuse input holding more than one statement
    Reject,
}

/// Sandbox engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wall-clock limit per submission; `None` disables the limit
    pub query_timeout_ms: Option<u64>,
    /// Multi-statement handling
    pub multi_statement: MultiStatementPolicy,
    /// Turn on SQLite foreign key enforcement
    pub enforce_foreign_keys: bool,
    /// VM instructions between time-limit checks
    pub progress_interval: i32,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a per-submission time limit
    #[inline]
    #[must_use]
    pub fn with_query_timeout(mut self, limit: Duration) -> Self {
        self.query_timeout_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With multi-statement policy
    #[inline]
    #[must_use]
    pub fn with_multi_statement(mut self, policy: MultiStatementPolicy) -> Self {
        self.multi_statement = policy;
        self
    }

    /// With foreign key enforcement
    #[inline]
    #[must_use]
    pub fn with_foreign_keys(mut self, enforce: bool) -> Self {
        self.enforce_foreign_keys = enforce;
        self
    }

    /// Time limit as a duration
    #[inline]
    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `EngineError::Config` for a zero time limit or a non-positive progress interval.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.query_timeout_ms == Some(0) {
            return Err(EngineError::Config(
                "query_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.progress_interval <= 0 {
            return Err(EngineError::Config(format!(
                "progress_interval must be positive, got {}",
                self.progress_interval
            )));
        }
        Ok(())
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// `EngineError::Config` for malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `EngineError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: None,
            multi_statement: MultiStatementPolicy::FirstResult,
            enforce_foreign_keys: false,
            progress_interval: 1000,
        }
    }
}
