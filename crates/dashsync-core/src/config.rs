//! Application configuration management.
//!
//! Read-only configuration: where local data lives, gateway cache and
//! timeout settings, provider endpoints, and the fast-tier storage budget.
//!
//! Read from `~/.config/dashsync/config.json`; a missing file means defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gateway::Endpoints;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "dashsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides the data directory when set
pub const DATA_DIR_ENV: &str = "DASHSYNC_DATA_DIR";

/// Gateway cache lifetime: 5 minutes
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Roughly what a browser grants local storage
pub const DEFAULT_FAST_TIER_BUDGET_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub cache_ttl_secs: u64,
    /// No deadline when unset; the transport's own timeouts apply.
    pub request_timeout_secs: Option<u64>,
    pub endpoints: Endpoints,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            request_timeout_secs: None,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub fast_tier_budget_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fast_tier_budget_bytes: DEFAULT_FAST_TIER_BUDGET_BYTES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the storage tiers keep their files: `DASHSYNC_DATA_DIR`, then
    /// the configured directory, then the platform data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
