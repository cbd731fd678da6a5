//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path (the `--config` flag)
//! 2. `$REGMIRROR_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/regmirror/config.toml`
//! 4. `~/.regmirror/config.toml`
//!
//! A missing file is not an error: defaults apply and no registries are
//! configured. An explicit path that does not exist is an error.
//!
//! # Example
//!
//! ```no_run
//! use registry_mirror::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! for registry in config.registries().unwrap() {
//!     println!("{} <- {}", registry.name, registry.source_url);
//! }
//! println!("every {:?}", config.interval());
//! ```

pub mod schema;

pub use schema::{AllowlistConfig, MirrorConfig, RegistryConfig, StoreConfig, SyncConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::allowlist::AllowlistSettings;
use crate::core::registry::{AllowlistPolicy, LayoutVariant, RegistryDescriptor};
use crate::core::types::BranchName;
use crate::engine::{DirectoryFailurePolicy, EngineSettings};
use crate::store::StoreBackend;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REGMIRROR_CONFIG";

/// Default seconds between scheduled refreshes.
pub const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Default tracked branch.
pub const DEFAULT_BRANCH: &str = "master";

/// Default testnet directory for the split layout.
pub const DEFAULT_TESTNET_PATH: &str = "testnets";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: MirrorConfig,
    /// Where the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation, or if `explicit` points at a missing file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_file(path);
        }

        match Self::discover() {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: MirrorConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// First existing config file in the default search order.
    pub fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("regmirror/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".regmirror/config.toml"))
            .filter(|path| path.exists())
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: MirrorConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Parent directory for working copies and the file store.
    ///
    /// Defaults to `<local data dir>/regmirror`.
    pub fn data_dir(&self) -> PathBuf {
        self.file.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("regmirror")
        })
    }

    /// Selected store backend.
    ///
    /// Defaults to a file store under `<data_dir>/store`.
    pub fn store_backend(&self) -> StoreBackend {
        let store = self.file.store.clone().unwrap_or_default();
        match store.backend.as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("redis") => StoreBackend::Redis(store.url.unwrap_or_default()),
            _ => StoreBackend::File(
                store
                    .path
                    .unwrap_or_else(|| self.data_dir().join("store")),
            ),
        }
    }

    /// Allowlist endpoint settings.
    pub fn allowlist_settings(&self) -> AllowlistSettings {
        let defaults = AllowlistSettings::default();
        let Some(section) = &self.file.allowlist else {
            return defaults;
        };
        AllowlistSettings {
            url: section.url.clone().unwrap_or(defaults.url),
            timeout: section
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            retries: section.retries.unwrap_or(defaults.retries),
            retry_backoff: section
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
        }
    }

    /// Refresh pipeline settings.
    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let Some(section) = &self.file.sync else {
            return defaults;
        };
        EngineSettings {
            concurrency: section.concurrency.unwrap_or(defaults.concurrency),
            depth: section.depth.unwrap_or(defaults.depth),
            git_timeout: section
                .git_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.git_timeout),
            on_directory_failure: match section.on_directory_failure.as_deref() {
                Some("isolate") => DirectoryFailurePolicy::Isolate,
                Some(_) => DirectoryFailurePolicy::Abort,
                None => defaults.on_directory_failure,
            },
        }
    }

    /// Time between scheduled refreshes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(
            self.file
                .sync
                .as_ref()
                .and_then(|s| s.interval_secs)
                .unwrap_or(DEFAULT_INTERVAL_SECS),
        )
    }

    /// Descriptors for every configured registry.
    pub fn registries(&self) -> Result<Vec<RegistryDescriptor>, ConfigError> {
        self.file
            .registries
            .iter()
            .map(|entry| self.descriptor(entry))
            .collect()
    }

    fn descriptor(&self, entry: &RegistryConfig) -> Result<RegistryDescriptor, ConfigError> {
        let name = entry.resolved_name()?;
        let branch = BranchName::new(entry.branch.as_deref().unwrap_or(DEFAULT_BRANCH))
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        let local_path = entry
            .work_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join(name.as_str()));

        let layout = match entry.layout.as_deref() {
            Some("mainnet-testnet-split") => LayoutVariant::MainnetTestnetSplit {
                testnet_path: entry
                    .testnet_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TESTNET_PATH)),
            },
            _ => LayoutVariant::SingleRoot,
        };

        let allowlist_policy = match entry.allowlist.as_deref() {
            Some("by-name") => AllowlistPolicy::ByName {
                include_archived: entry.include_archived.unwrap_or(false),
            },
            Some("by-directory-existence") => AllowlistPolicy::ByDirectoryExistence,
            _ => AllowlistPolicy::None,
        };

        let mut descriptor = RegistryDescriptor::new(name, entry.url.clone(), branch, local_path)
            .with_layout(layout)
            .with_exclude(entry.exclude.iter().cloned())
            .with_allowlist_policy(allowlist_policy);
        if let Some(sub_path) = &entry.path {
            descriptor = descriptor.with_sub_path(sub_path);
        }
        if let Some(marker) = &entry.require {
            descriptor = descriptor.with_required_marker(marker);
        }
        Ok(descriptor)
    }
}
