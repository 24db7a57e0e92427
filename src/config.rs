//! Configuration Management
//!
//! Optional JSON file at `<config_dir>/cloud-inventory/config.json`. Every
//! field may be omitted; command line flags win over the file.

use crate::aws::credentials;
use crate::inventory::InventorySettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_concurrency() -> usize {
    8
}

fn default_region_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Credentials profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Region asked for the list of enabled regions
    #[serde(default = "default_region")]
    pub reference_region: String,
    /// Region of buckets created without a location constraint
    #[serde(default = "default_region")]
    pub default_bucket_region: String,
    /// Send every request here instead of the public endpoints
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Regions processed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-region deadline, 0 to disable
    #[serde(default = "default_region_timeout_secs")]
    pub region_timeout_secs: u64,
    /// Per-request timeout, 0 to disable
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: None,
            reference_region: default_region(),
            default_bucket_region: default_region(),
            endpoint_url: None,
            concurrency: default_concurrency(),
            region_timeout_secs: default_region_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cloud-inventory").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
    }

    /// Get effective profile (CLI > config > AWS_PROFILE > default)
    pub fn effective_profile(&self) -> String {
        self.profile
            .clone()
            .filter(|p| credentials::validate_profile_name(p))
            .unwrap_or_else(credentials::default_profile)
    }

    /// Per-request timeout for the HTTP client
    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }

    /// Settings handed to the inventory core
    pub fn settings(&self) -> InventorySettings {
        InventorySettings {
            reference_region: self.reference_region.clone(),
            default_bucket_region: self.default_bucket_region.clone(),
            concurrency: self.concurrency.max(1),
            region_timeout: non_zero_secs(self.region_timeout_secs),
        }
    }
}
