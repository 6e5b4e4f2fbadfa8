//! Runtime configuration.
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables. Every table and field is optional.
//!
//! # Example
//!
//! ```toml
//! [store]
//! base_url = "https://stories.example.com/api"
//! auth_token = "sk_..."
//!
//! [retry]
//! timeout_ms = 5000
//! max_attempts = 4
//!
//! [log]
//! filter = "storyday_workflow=debug,warn"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::retry::{
    RetryPolicy, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_TIMEOUT_MS,
};

pub const ENV_BASE_URL: &str = "STORYDAY_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "STORYDAY_AUTH_TOKEN";
pub const ENV_LOG: &str = "STORYDAY_LOG";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorydayConfig {
    pub store: StoreConfig,
    pub retry: RetryConfig,
    pub log: LogConfig,
}

/// `[store]`: where the HTTP store lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
}

/// `[retry]`: per-call timeout and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

/// `[log]`: default tracing filter when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "warn".to_string(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StorydayConfig {
    /// Read `path` if given (a missing explicit file is an error), then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, WorkflowError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    WorkflowError::Config(format!("could not read '{}': {}", path.display(), e))
                })?;
                Self::from_toml_str(&content).map_err(|e| match e {
                    WorkflowError::Config(msg) => {
                        WorkflowError::Config(format!("'{}': {}", path.display(), msg))
                    }
                    other => other,
                })?
            }
            None => StorydayConfig::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, WorkflowError> {
        toml::from_str(content).map_err(|e| WorkflowError::Config(format!("could not parse: {}", e)))
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_BASE_URL) {
            self.store.base_url = Some(url);
        }
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.store.auth_token = Some(token);
        }
        if let Some(filter) = get(ENV_LOG) {
            self.log.filter = filter;
        }
        self
    }

    /// The store URL, required by every command that talks to the store.
    pub fn require_base_url(&self) -> Result<&str, WorkflowError> {
        self.store
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                WorkflowError::Config(format!(
                    "no store URL configured: set [store] base_url or {}",
                    ENV_BASE_URL
                ))
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.retry.timeout_ms),
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
