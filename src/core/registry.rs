//! core::registry
//!
//! Static description of one mirrored registry.
//!
//! A single descriptor shape covers every registry variant: where candidate
//! directories live is a [`LayoutVariant`], and which of them are eligible
//! is an [`AllowlistPolicy`].

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::document::RepositoryDescriptor;
use super::types::{BranchName, RegistryName};

/// Network a chain directory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::Testnet => write!(f, "testnet"),
        }
    }
}

/// Where candidate directories live within a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutVariant {
    /// Immediate subdirectories of the scan root.
    SingleRoot,
    /// Subdirectories of the scan root (mainnet) followed by subdirectories
    /// of `testnet_path` relative to the scan root (testnet).
    MainnetTestnetSplit { testnet_path: PathBuf },
}

/// Which candidate directories the external allowlist admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowlistPolicy {
    /// No allowlist; the fetcher is never called.
    None,
    /// Directory name must match an entry's `chain_name`.
    ByName {
        /// Admit entries flagged `is_archive`
        include_archived: bool,
    },
    /// Directory name must match an entry's `chain_name` whose
    /// `network_type` equals the directory's origin.
    ByDirectoryExistence,
}

impl AllowlistPolicy {
    /// Whether the allowlist must be fetched for this policy.
    pub fn requires_allowlist(&self) -> bool {
        !matches!(self, AllowlistPolicy::None)
    }
}

/// Static configuration for one registry instance.
///
/// # Example
///
/// ```
/// use registry_mirror::core::registry::{AllowlistPolicy, RegistryDescriptor};
/// use registry_mirror::core::types::{BranchName, RegistryName};
///
/// let descriptor = RegistryDescriptor::new(
///     RegistryName::new("chain-registry").unwrap(),
///     "https://github.com/cosmos/chain-registry",
///     BranchName::new("master").unwrap(),
///     "/var/lib/regmirror/chain-registry",
/// )
/// .with_exclude(["_IBC", "testnets"])
/// .with_required_marker("chain.json")
/// .with_allowlist_policy(AllowlistPolicy::ByName { include_archived: false });
///
/// assert!(descriptor.is_excluded("_IBC"));
/// assert_eq!(descriptor.key("paths"), "chain-registry:paths");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDescriptor {
    pub name: RegistryName,
    pub source_url: String,
    pub branch: BranchName,
    /// Root of the working copy; wiped on every refresh
    pub local_path: PathBuf,
    /// Scan root relative to `local_path`
    pub sub_path: Option<PathBuf>,
    pub layout: LayoutVariant,
    pub exclude: BTreeSet<String>,
    pub required_marker: Option<String>,
    pub allowlist_policy: AllowlistPolicy,
}

impl RegistryDescriptor {
    /// Create a single-root descriptor with no filters beyond hidden names.
    pub fn new(
        name: RegistryName,
        source_url: impl Into<String>,
        branch: BranchName,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name,
            source_url: source_url.into(),
            branch,
            local_path: local_path.into(),
            sub_path: None,
            layout: LayoutVariant::SingleRoot,
            exclude: BTreeSet::new(),
            required_marker: None,
            allowlist_policy: AllowlistPolicy::None,
        }
    }

    pub fn with_layout(mut self, layout: LayoutVariant) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_sub_path(mut self, sub_path: impl Into<PathBuf>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_required_marker(mut self, marker: impl Into<String>) -> Self {
        self.required_marker = Some(marker.into());
        self
    }

    pub fn with_allowlist_policy(mut self, policy: AllowlistPolicy) -> Self {
        self.allowlist_policy = policy;
        self
    }

    /// Directory scanned for mainnet (or single-root) candidates.
    pub fn scan_root(&self) -> PathBuf {
        match &self.sub_path {
            Some(sub) => self.local_path.join(sub),
            None => self.local_path.clone(),
        }
    }

    /// Directory scanned for testnet candidates, if the layout has one.
    pub fn testnet_root(&self) -> Option<PathBuf> {
        match &self.layout {
            LayoutVariant::SingleRoot => None,
            LayoutVariant::MainnetTestnetSplit { testnet_path } => {
                Some(self.scan_root().join(testnet_path))
            }
        }
    }

    /// Whether a directory name is listed in the exclude set.
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.exclude.contains(dir_name)
    }

    /// Path of the cross-process lock file guarding the working copy.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .local_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| self.name.as_str().into());
        name.push(".lock");
        match self.local_path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Composite store key `<name>:<suffix>`.
    pub fn key(&self, suffix: &str) -> String {
        crate::store::key(&self.name, suffix)
    }

    /// The persisted `{name, url, branch}` record.
    pub fn repository(&self) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: self.name.clone(),
            url: self.source_url.clone(),
            branch: self.branch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> RegistryDescriptor {
        RegistryDescriptor::new(
            RegistryName::new("chain-registry").unwrap(),
            "https://example/chain-registry",
            BranchName::new("master").unwrap(),
            "/data/chain-registry",
        )
    }

    #[test]
    fn defaults() {
        let d = descriptor();
        assert_eq!(d.layout, LayoutVariant::SingleRoot);
        assert_eq!(d.allowlist_policy, AllowlistPolicy::None);
        assert!(d.exclude.is_empty());
        assert!(d.required_marker.is_none());
        assert_eq!(d.scan_root(), PathBuf::from("/data/chain-registry"));
        assert!(d.testnet_root().is_none());
    }

    #[test]
    fn sub_path_moves_scan_root() {
        let d = descriptor().with_sub_path("chains");
        assert_eq!(d.scan_root(), PathBuf::from("/data/chain-registry/chains"));
    }

    #[test]
    fn split_layout_testnet_root() {
        let d = descriptor().with_layout(LayoutVariant::MainnetTestnetSplit {
            testnet_path: PathBuf::from("testnets"),
        });
        assert_eq!(
            d.testnet_root(),
            Some(PathBuf::from("/data/chain-registry/testnets"))
        );
    }

    #[test]
    fn lock_path_is_sibling() {
        assert_eq!(
            descriptor().lock_path(),
            PathBuf::from("/data/chain-registry.lock")
        );
    }

    #[test]
    fn keys_are_namespaced() {
        let d = descriptor();
        assert_eq!(d.key("cosmoshub"), "chain-registry:cosmoshub");
        assert_eq!(d.key("commit"), "chain-registry:commit");
    }

    #[test]
    fn policy_requires_allowlist() {
        assert!(!AllowlistPolicy::None.requires_allowlist());
        assert!(AllowlistPolicy::ByName {
            include_archived: false
        }
        .requires_allowlist());
        assert!(AllowlistPolicy::ByDirectoryExistence.requires_allowlist());
    }

    #[test]
    fn network_type_serde() {
        assert_eq!(
            serde_json::to_string(&NetworkType::Testnet).unwrap(),
            "\"testnet\""
        );
        let parsed: NetworkType = serde_json::from_str("\"mainnet\"").unwrap();
        assert_eq!(parsed, NetworkType::Mainnet);
    }
}
