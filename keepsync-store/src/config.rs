//! Store configuration
//!
//! Environment variables:
//!   KEEPSYNC_DATABASE_URL       # Postgres DSN (falls back to DATABASE_URL)
//!   KEEPSYNC_MAX_CONNECTIONS    # Pool size (default: 5)
//!   KEEPSYNC_ACQUIRE_TIMEOUT    # Seconds to wait for a pooled connection (default: 5)
//!   KEEPSYNC_MIGRATIONS_DIR     # Load migrations from this directory instead of the embedded set
//!   KEEPSYNC_MIGRATION_POLICY   # best-effort | fail-fast (default: best-effort)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, Result};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default seconds to wait when acquiring a pooled connection.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// What to do when migrations fail on a fresh connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPolicy {
    /// Log the failure and keep serving with the current schema
    #[default]
    BestEffort,
    /// Refuse to start
    FailFast,
}

impl FromStr for MigrationPolicy {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            other => Err(KeeperError::Configuration(format!(
                "unknown migration policy '{}' (expected best-effort or fail-fast)",
                other
            ))),
        }
    }
}

/// Connection and migration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub migrations_dir: Option<PathBuf>,
    pub migration_policy: MigrationPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            migrations_dir: None,
            migration_policy: MigrationPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Config for a DSN with every other setting at its default.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Overlay environment settings on `self`, reading variables through `lookup`.
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("KEEPSYNC_DATABASE_URL").or_else(|| non_empty("DATABASE_URL")) {
            self.database_url = url;
        }

        if let Some(raw) = non_empty("KEEPSYNC_MAX_CONNECTIONS") {
            self.max_connections = raw.trim().parse().map_err(|_| {
                KeeperError::Configuration(format!("KEEPSYNC_MAX_CONNECTIONS: invalid number '{}'", raw))
            })?;
        }

        if let Some(raw) = non_empty("KEEPSYNC_ACQUIRE_TIMEOUT") {
            self.acquire_timeout_secs = raw.trim().parse().map_err(|_| {
                KeeperError::Configuration(format!("KEEPSYNC_ACQUIRE_TIMEOUT: invalid number '{}'", raw))
            })?;
        }

        if let Some(dir) = non_empty("KEEPSYNC_MIGRATIONS_DIR") {
            self.migrations_dir = Some(PathBuf::from(dir));
        }

        if let Some(policy) = non_empty("KEEPSYNC_MIGRATION_POLICY") {
            self.migration_policy = policy.parse()?;
        }

        Ok(self)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Check the settings that would otherwise only fail at connect time.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(KeeperError::Configuration("dsn is empty".into()));
        }
        if self.max_connections == 0 {
            return Err(KeeperError::Configuration(
                "max_connections must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
