//! allowlist::traits
//!
//! The allowlist fetcher trait and its data types.
//!
//! # Design
//!
//! The trait is async because the production source is an HTTP endpoint.
//! A fetch either yields the complete list or fails; there is no partial
//! result. Eligibility checks run against an [`Allowlist`], an indexed view
//! of the fetched entries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::registry::NetworkType;

/// Errors from allowlist fetches.
#[derive(Debug, Clone, Error)]
pub enum AllowlistError {
    /// Connection, DNS or TLS failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not finish within its timeout.
    #[error("allowlist request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("allowlist endpoint returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        message: String,
    },

    /// The body was not a JSON array of allowlist entries.
    #[error("malformed allowlist: {0}")]
    Malformed(String),
}

impl AllowlistError {
    /// Whether another attempt might succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 are transient; other 4xx
    /// responses and malformed bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AllowlistError::Network(_) | AllowlistError::Timeout => true,
            AllowlistError::Status { status, .. } => *status >= 500 || *status == 429,
            AllowlistError::Malformed(_) => false,
        }
    }
}

/// One element of the allowlist response.
///
/// Unknown fields are ignored; the endpoint carries far more than we use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistEntry {
    /// Directory name the entry admits
    #[serde(alias = "chainName")]
    pub chain_name: String,
    /// Network the entry belongs to
    #[serde(alias = "networkType", default = "default_network")]
    pub network_type: NetworkType,
    /// Archived chains are skipped unless explicitly included
    #[serde(alias = "isArchive", default)]
    pub is_archive: bool,
}

fn default_network() -> NetworkType {
    NetworkType::Mainnet
}

impl AllowlistEntry {
    pub fn new(chain_name: impl Into<String>, network_type: NetworkType) -> Self {
        Self {
            chain_name: chain_name.into(),
            network_type,
            is_archive: false,
        }
    }

    pub fn archived(mut self) -> Self {
        self.is_archive = true;
        self
    }
}

/// Indexed view of a fetched allowlist.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    by_name: HashMap<String, Vec<AllowlistEntry>>,
}

impl Allowlist {
    pub fn new(entries: impl IntoIterator<Item = AllowlistEntry>) -> Self {
        let mut by_name: HashMap<String, Vec<AllowlistEntry>> = HashMap::new();
        for entry in entries {
            by_name
                .entry(entry.chain_name.clone())
                .or_default()
                .push(entry);
        }
        Self { by_name }
    }

    /// Number of distinct chain names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Whether some entry names `dir_name`, optionally ignoring archived ones.
    pub fn admits_name(&self, dir_name: &str, include_archived: bool) -> bool {
        self.by_name
            .get(dir_name)
            .is_some_and(|entries| entries.iter().any(|e| include_archived || !e.is_archive))
    }

    /// Whether some entry names `dir_name` on the given network.
    pub fn admits_network(&self, dir_name: &str, network: NetworkType) -> bool {
        self.by_name
            .get(dir_name)
            .is_some_and(|entries| entries.iter().any(|e| e.network_type == network))
    }
}

/// Source of allowlist entries.
#[async_trait]
pub trait AllowlistFetcher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Retrieve the complete allowlist.
    async fn fetch(&self) -> Result<Vec<AllowlistEntry>, AllowlistError>;
}
