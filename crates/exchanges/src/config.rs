//! Per-adapter configuration

use crate::auth::Credentials;
use crate::errors::{ExchangeError, Result};
use crate::types::DataSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tradegate_core::generate_id_with_prefix;

/// Default number of book levels requested from an exchange
pub const DEFAULT_DEPTH: u32 = 100;

/// Configuration of one exchange adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Registry namespace for this adapter's constraints and balances
    pub name: String,
    #[serde(default)]
    pub credentials: Credentials,
    /// Overrides the venue's production endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub source: DataSource,
    /// Catalog file read when `source` is `JsonFile`
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Identity stamped on every captured order book
    #[serde(default = "default_worker_id")]
    pub worker_id: String,
    /// Record raw request and response text on account operations
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_worker_id() -> String {
    generate_id_with_prefix("worker")
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

impl ExchangeConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            credentials: Credentials::default(),
            base_url: None,
            source: DataSource::ExchangeApi,
            snapshot_path: None,
            worker_id: default_worker_id(),
            debug_mode: false,
            depth: DEFAULT_DEPTH,
        }
    }

    pub fn with_credentials(mut self, api_key: &str, secret_key: &str) -> Self {
        self.credentials = Credentials::new(api_key, secret_key);
        self
    }

    /// Load `<PREFIX>_API_KEY` / `<PREFIX>_SECRET_KEY` from the environment
    pub fn with_env_credentials(mut self, prefix: &str) -> Result<Self> {
        self.credentials = Credentials::from_env(prefix)?;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    /// Serve coins and pairs from a catalog file instead of live discovery
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = DataSource::JsonFile;
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_worker_id(mut self, worker_id: &str) -> Self {
        self.worker_id = worker_id.to_string();
        self
    }

    pub fn with_debug(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ExchangeError::from(e).with_payload(raw))?;
        if config.name.trim().is_empty() {
            return Err(ExchangeError::Configuration("exchange name is empty".to_string()));
        }
        Ok(config)
    }
}
