//! Engine configuration
//!
//! Loaded from a JSON file and validated before use. The ledger identity is
//! part of the configuration and is handed to the engine explicitly; nothing
//! about who is querying the ledger is ambient.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this structure
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unacceptable value
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Identity used to enroll with the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIdentity {
    /// Enrolled user name
    pub user: String,
    /// Organization / membership provider the user belongs to
    #[serde(default)]
    pub organization: Option<String>,
}

impl LedgerIdentity {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            organization: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ledger identity (required)
    pub identity: LedgerIdentity,

    /// Channel queried; a fixture ledger must hold only this channel (optional, default "mychannel")
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Maximum number of ledger fetches in flight per query (optional, default 8)
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON block fixture served by the in-memory ledger (CLI only)
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
}

fn default_channel() -> String {
    "mychannel".to_string()
}
fn default_fetch_concurrency() -> usize {
    8
}
fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Creates a configuration with defaults for everything but the identity
    pub fn new(identity: LedgerIdentity) -> Self {
        Self {
            identity,
            channel: default_channel(),
            fetch_concurrency: default_fetch_concurrency(),
            log_level: default_log_level(),
            ledger_path: None,
        }
    }

    /// Sets the fetch concurrency
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n;
        self
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.identity.user.trim().is_empty() {
            return Err(ConfigError::Invalid("identity.user must not be empty".into()));
        }

        if self.fetch_concurrency == 0 {
            return Err(ConfigError::Invalid("fetch_concurrency must be > 0".into()));
        }

        self.log_severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            other => Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error.",
                other
            ))),
        }
    }
}
