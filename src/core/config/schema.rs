//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! data_dir = "/var/lib/regmirror"
//!
//! [store]
//! backend = "file"          # memory | file | redis
//! path = "/var/lib/regmirror/store"
//!
//! [allowlist]
//! url = "https://raw.githubusercontent.com/nodejumper-org/jumper-assets/master/chains.json"
//! timeout_ms = 5000
//! retries = 3
//!
//! [sync]
//! interval_secs = 900
//! git_timeout_secs = 300
//! concurrency = 32
//! depth = 1
//! on_directory_failure = "abort"   # abort | isolate
//!
//! [[registry]]
//! url = "https://github.com/cosmos/chain-registry"
//! branch = "master"
//! exclude = ["_IBC", "_non-cosmos", "testnets"]
//! require = "chain.json"
//! allowlist = "by-name"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing so a bad registry entry is reported
//! at load time rather than on the first refresh.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, RegistryName};

/// Valid `[store] backend` values.
pub const STORE_BACKENDS: &[&str] = &["memory", "file", "redis"];

/// Valid `[[registry]] layout` values.
pub const LAYOUTS: &[&str] = &["single-root", "mainnet-testnet-split"];

/// Valid `[[registry]] allowlist` values.
pub const ALLOWLIST_POLICIES: &[&str] = &["none", "by-name", "by-directory-existence"];

/// Valid `[sync] on_directory_failure` values.
pub const DIRECTORY_FAILURE_POLICIES: &[&str] = &["abort", "isolate"];

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Parent directory for working copies and the file store
    pub data_dir: Option<PathBuf>,

    /// Store backend settings
    pub store: Option<StoreConfig>,

    /// Allowlist endpoint settings
    pub allowlist: Option<AllowlistConfig>,

    /// Refresh pipeline settings
    pub sync: Option<SyncConfig>,

    /// Mirrored registries
    #[serde(rename = "registry")]
    pub registries: Vec<RegistryConfig>,
}

impl MirrorConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if let Some(allowlist) = &self.allowlist {
            allowlist.validate()?;
        }
        if let Some(sync) = &self.sync {
            sync.validate()?;
        }

        let mut seen = std::collections::BTreeSet::new();
        for registry in &self.registries {
            registry.validate()?;
            let name = registry.resolved_name()?;
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate registry name '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend name (default: "file")
    pub backend: Option<String>,
    /// Directory for the file backend (default: `<data_dir>/store`)
    pub path: Option<PathBuf>,
    /// Connection URL for the redis backend
    pub url: Option<String>,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(backend) = &self.backend {
            check_one_of("store backend", backend, STORE_BACKENDS)?;
            if backend == "redis" && self.url.is_none() {
                return Err(ConfigError::InvalidValue(
                    "store backend 'redis' requires a url".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// `[allowlist]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AllowlistConfig {
    /// Endpoint returning the supported-chain array
    pub url: Option<String>,
    /// Per-request timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt
    pub retries: Option<u32>,
    /// Backoff unit between retries in milliseconds
    pub retry_backoff_ms: Option<u64>,
}

impl AllowlistConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "allowlist url must be http(s): '{}'",
                    url
                )));
            }
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "allowlist timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[sync]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Seconds between scheduled refreshes
    pub interval_secs: Option<u64>,
    /// Deadline for each git network operation
    pub git_timeout_secs: Option<u64>,
    /// Maximum directories processed at once
    pub concurrency: Option<usize>,
    /// Clone depth (0 = full history)
    pub depth: Option<u32>,
    /// What a failed directory does to the rest of the run
    pub on_directory_failure: Option<String>,
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.git_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync git_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue(
                "sync concurrency must be greater than zero".to_string(),
            ));
        }
        if let Some(policy) = &self.on_directory_failure {
            check_one_of("on_directory_failure", policy, DIRECTORY_FAILURE_POLICIES)?;
        }
        Ok(())
    }
}

/// One `[[registry]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Store namespace (default: last segment of `url`)
    pub name: Option<String>,
    /// Git remote URL
    pub url: String,
    /// Tracked branch (default: "master")
    pub branch: Option<String>,
    /// Scan root inside the working copy
    pub path: Option<PathBuf>,
    /// Working-copy location (default: `<data_dir>/<name>`)
    pub work_dir: Option<PathBuf>,
    /// Layout variant (default: "single-root")
    pub layout: Option<String>,
    /// Testnet directory for the split layout (default: "testnets")
    pub testnet_path: Option<PathBuf>,
    /// Directory names never published
    pub exclude: Vec<String>,
    /// Marker file a directory must contain
    pub require: Option<String>,
    /// Allowlist policy (default: "none")
    pub allowlist: Option<String>,
    /// Admit archived allowlist entries under "by-name"
    pub include_archived: Option<bool>,
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "registry url cannot be empty".to_string(),
            ));
        }
        self.resolved_name()?;
        if let Some(branch) = &self.branch {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid branch for '{}': {}", self.url, e))
            })?;
        }
        if let Some(layout) = &self.layout {
            check_one_of("layout", layout, LAYOUTS)?;
        }
        if let Some(policy) = &self.allowlist {
            check_one_of("allowlist", policy, ALLOWLIST_POLICIES)?;
        }
        if let Some(require) = &self.require {
            if require.is_empty() || require.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "require must be a plain file name: '{}'",
                    require
                )));
            }
        }
        Ok(())
    }

    /// The configured name, or one derived from the URL.
    pub fn resolved_name(&self) -> Result<RegistryName, ConfigError> {
        let name = match &self.name {
            Some(name) => RegistryName::new(name.as_str()),
            None => RegistryName::from_url(&self.url),
        };
        name.map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }
}

fn check_one_of(field: &str, value: &str, valid: &[&str]) -> Result<(), ConfigError> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "invalid {} '{}', must be one of: {}",
            field,
            value,
            valid.join(", ")
        )))
    }
}
