//! aggregate
//!
//! Turns a checked-out working copy into chain documents.
//!
//! # Architecture
//!
//! [`DirectoryAggregator`] enumerates candidate directories according to
//! the registry's layout variant, then filters them in a fixed order:
//!
//! 1. hidden names (leading `.`)
//! 2. the exclude set
//! 3. the allowlist policy
//! 4. the required marker file
//!
//! Any failing filter drops the directory. Survivors are built into
//! documents by [`build_document`]; the engine drives that step so each
//! document is written as soon as it is built.
//!
//! # Ordering
//!
//! Candidates are sorted by name within each origin, mainnet before
//! testnet, so two runs over the same tree produce the same index.

mod document;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::allowlist::Allowlist;
use crate::core::registry::{AllowlistPolicy, NetworkType, RegistryDescriptor};

pub use document::{build_document, build_document_async};

/// Filesystem failures while scanning or building.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// A scan root could not be listed.
    #[error("cannot list {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// One directory's document could not be built.
    #[error("cannot build document for '{dir}': {message}")]
    DocumentBuild { dir: String, message: String },
}

/// A directory that may become a chain document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Directory name; also the document path and key suffix
    pub name: String,
    /// Absolute directory path
    pub dir: PathBuf,
    /// Which side of a split layout it came from
    pub origin: NetworkType,
}

/// Candidate enumeration and filtering for one registry.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryAggregator<'a> {
    descriptor: &'a RegistryDescriptor,
}

impl<'a> DirectoryAggregator<'a> {
    pub fn new(descriptor: &'a RegistryDescriptor) -> Self {
        Self { descriptor }
    }

    /// All candidate directories, before filtering.
    ///
    /// # Errors
    ///
    /// Returns `FilesystemError::ListDirectory` if the scan root cannot be
    /// listed. A missing testnet directory yields no testnet candidates.
    pub fn candidates(&self) -> Result<Vec<Candidate>, FilesystemError> {
        let scan_root = self.descriptor.scan_root();
        let testnet_root = self.descriptor.testnet_root();

        let mut candidates = list_dirs(&scan_root, NetworkType::Mainnet)?;
        if let Some(testnet_root) = testnet_root {
            candidates.retain(|c| c.dir != testnet_root);
            if testnet_root.is_dir() {
                candidates.extend(list_dirs(&testnet_root, NetworkType::Testnet)?);
            }
        }
        Ok(candidates)
    }

    /// Whether `candidate` passes every filter.
    ///
    /// `allowlist` must be present when the policy requires one; a missing
    /// list admits nothing.
    pub fn is_eligible(&self, candidate: &Candidate, allowlist: Option<&Allowlist>) -> bool {
        if !admits(self.descriptor, allowlist, &candidate.name, candidate.origin) {
            return false;
        }
        match &self.descriptor.required_marker {
            Some(marker) => candidate.dir.join(marker).is_file(),
            None => true,
        }
    }

    /// Filtered candidates in publication order.
    pub fn eligible(&self, allowlist: Option<&Allowlist>) -> Result<Vec<Candidate>, FilesystemError> {
        let candidates = self.candidates()?;
        let total = candidates.len();
        let eligible: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| self.is_eligible(c, allowlist))
            .collect();

        tracing::debug!(
            registry = %self.descriptor.name,
            candidates = total,
            eligible = eligible.len(),
            "scanned directories"
        );
        Ok(eligible)
    }
}

/// Name-level filters: hidden prefix, exclude set, allowlist policy.
///
/// The marker filter needs the filesystem and lives in
/// [`DirectoryAggregator::is_eligible`].
pub fn admits(
    descriptor: &RegistryDescriptor,
    allowlist: Option<&Allowlist>,
    name: &str,
    origin: NetworkType,
) -> bool {
    if name.starts_with('.') || descriptor.is_excluded(name) {
        return false;
    }
    match (descriptor.allowlist_policy, allowlist) {
        (AllowlistPolicy::None, _) => true,
        (_, None) => false,
        (AllowlistPolicy::ByName { include_archived }, Some(list)) => {
            list.admits_name(name, include_archived)
        }
        (AllowlistPolicy::ByDirectoryExistence, Some(list)) => list.admits_network(name, origin),
    }
}

fn list_dirs(root: &Path, origin: NetworkType) -> Result<Vec<Candidate>, FilesystemError> {
    let list_err = |source| FilesystemError::ListDirectory {
        path: root.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(dir = %dir.display(), "skipping directory with non UTF-8 name");
            continue;
        };
        candidates.push(Candidate { name, dir, origin });
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::AllowlistEntry;
    use crate::core::registry::LayoutVariant;
    use crate::core::types::{BranchName, RegistryName};
    use tempfile::TempDir;

    fn descriptor(root: &Path) -> RegistryDescriptor {
        RegistryDescriptor::new(
            RegistryName::new("chain-registry").unwrap(),
            "https://example/chain-registry",
            BranchName::new("master").unwrap(),
            root,
        )
    }

    fn mkdirs(root: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir_all(root.join(name)).unwrap();
        }
    }

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    mod enumeration {
        use super::*;

        #[test]
        fn single_root_lists_sorted_directories_only() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["osmosis", "cosmoshub", ".github"]);
            fs::write(temp.path().join("README.md"), "x").unwrap();

            let d = descriptor(temp.path());
            let candidates = DirectoryAggregator::new(&d).candidates().unwrap();

            assert_eq!(names(&candidates), vec![".github", "cosmoshub", "osmosis"]);
            assert!(candidates.iter().all(|c| c.origin == NetworkType::Mainnet));
        }

        #[test]
        fn sub_path_is_scan_root() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["chains/akash", "docs"]);

            let d = descriptor(temp.path()).with_sub_path("chains");
            let candidates = DirectoryAggregator::new(&d).candidates().unwrap();
            assert_eq!(names(&candidates), vec!["akash"]);
        }

        #[test]
        fn split_layout_tags_origin_and_skips_testnet_root() {
            let temp = TempDir::new().unwrap();
            mkdirs(
                temp.path(),
                &["cosmoshub", "axelar", "testnets/theta", "testnets/axelar"],
            );

            let d = descriptor(temp.path()).with_layout(LayoutVariant::MainnetTestnetSplit {
                testnet_path: PathBuf::from("testnets"),
            });
            let candidates = DirectoryAggregator::new(&d).candidates().unwrap();

            assert_eq!(
                names(&candidates),
                vec!["axelar", "cosmoshub", "axelar", "theta"]
            );
            let origins: Vec<_> = candidates.iter().map(|c| c.origin).collect();
            assert_eq!(
                origins,
                vec![
                    NetworkType::Mainnet,
                    NetworkType::Mainnet,
                    NetworkType::Testnet,
                    NetworkType::Testnet
                ]
            );
        }

        #[test]
        fn missing_testnet_dir_is_empty() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["cosmoshub"]);

            let d = descriptor(temp.path()).with_layout(LayoutVariant::MainnetTestnetSplit {
                testnet_path: PathBuf::from("testnets"),
            });
            let candidates = DirectoryAggregator::new(&d).candidates().unwrap();
            assert_eq!(names(&candidates), vec!["cosmoshub"]);
        }

        #[test]
        fn missing_scan_root_is_error() {
            let temp = TempDir::new().unwrap();
            let d = descriptor(&temp.path().join("absent"));
            let err = DirectoryAggregator::new(&d).candidates().unwrap_err();
            assert!(matches!(err, FilesystemError::ListDirectory { .. }));
        }
    }

    mod filtering {
        use super::*;

        #[test]
        fn hidden_excluded_and_allowlist() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["A", ".hidden", "B-excluded", "C", "D"]);

            let d = descriptor(temp.path())
                .with_exclude(["B-excluded"])
                .with_allowlist_policy(AllowlistPolicy::ByName {
                    include_archived: false,
                });
            let allowlist = Allowlist::new([
                AllowlistEntry::new("A", NetworkType::Mainnet),
                AllowlistEntry::new("C", NetworkType::Mainnet),
                AllowlistEntry::new("B-excluded", NetworkType::Mainnet),
                AllowlistEntry::new(".hidden", NetworkType::Mainnet),
            ]);

            let eligible = DirectoryAggregator::new(&d)
                .eligible(Some(&allowlist))
                .unwrap();
            assert_eq!(names(&eligible), vec!["A", "C"]);
        }

        #[test]
        fn archived_entries_respect_flag() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["terra", "juno"]);
            let allowlist = Allowlist::new([
                AllowlistEntry::new("terra", NetworkType::Mainnet).archived(),
                AllowlistEntry::new("juno", NetworkType::Mainnet),
            ]);

            let strict = descriptor(temp.path()).with_allowlist_policy(AllowlistPolicy::ByName {
                include_archived: false,
            });
            let eligible = DirectoryAggregator::new(&strict)
                .eligible(Some(&allowlist))
                .unwrap();
            assert_eq!(names(&eligible), vec!["juno"]);

            let lenient = descriptor(temp.path()).with_allowlist_policy(AllowlistPolicy::ByName {
                include_archived: true,
            });
            let eligible = DirectoryAggregator::new(&lenient)
                .eligible(Some(&allowlist))
                .unwrap();
            assert_eq!(names(&eligible), vec!["juno", "terra"]);
        }

        #[test]
        fn directory_existence_matches_origin() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["cosmoshub", "testnets/cosmoshub", "testnets/theta"]);

            let d = descriptor(temp.path())
                .with_layout(LayoutVariant::MainnetTestnetSplit {
                    testnet_path: PathBuf::from("testnets"),
                })
                .with_allowlist_policy(AllowlistPolicy::ByDirectoryExistence);
            let allowlist = Allowlist::new([
                AllowlistEntry::new("cosmoshub", NetworkType::Mainnet),
                AllowlistEntry::new("theta", NetworkType::Testnet),
            ]);

            let eligible = DirectoryAggregator::new(&d)
                .eligible(Some(&allowlist))
                .unwrap();
            let got: Vec<_> = eligible.iter().map(|c| (c.name.as_str(), c.origin)).collect();
            assert_eq!(
                got,
                vec![
                    ("cosmoshub", NetworkType::Mainnet),
                    ("theta", NetworkType::Testnet)
                ]
            );
        }

        #[test]
        fn required_marker() {
            let temp = TempDir::new().unwrap();
            mkdirs(temp.path(), &["with", "without"]);
            fs::write(temp.path().join("with/chain.json"), "{}").unwrap();
            fs::write(temp.path().join("without/assetlist.json"), "{}").unwrap();

            let d = descriptor(temp.path()).with_required_marker("chain.json");
            let eligible = DirectoryAggregator::new(&d).eligible(None).unwrap();
            assert_eq!(names(&eligible), vec!["with"]);
        }

        #[test]
        fn policy_without_list_admits_nothing() {
            let d = descriptor(Path::new("/x")).with_allowlist_policy(AllowlistPolicy::ByName {
                include_archived: false,
            });
            assert!(!admits(&d, None, "cosmoshub", NetworkType::Mainnet));
        }

        #[test]
        fn no_policy_ignores_list() {
            let d = descriptor(Path::new("/x"));
            assert!(admits(&d, None, "cosmoshub", NetworkType::Mainnet));
            assert!(!admits(&d, None, ".git", NetworkType::Mainnet));
        }
    }
}
