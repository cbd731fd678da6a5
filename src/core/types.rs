//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RegistryName`] - Validated registry name (the store key namespace)
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`Fingerprint`] - Content hash of a published snapshot
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a registry name containing the key separator
//! can never reach the store.
//!
//! # Examples
//!
//! ```
//! use registry_mirror::core::types::{BranchName, Oid, RegistryName};
//!
//! let name = RegistryName::new("chain-registry").unwrap();
//! let branch = BranchName::new("master").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//!
//! assert!(RegistryName::new("bad:name").is_err());
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! # let _ = (name, branch, oid);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::document::ChainDocument;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid registry name: {0}")]
    InvalidRegistryName(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated registry name.
///
/// The name namespaces every store key (`<name>:<suffix>`) and names the
/// working-copy directory, so it must not contain the key separator `:`,
/// path separators, or whitespace, and cannot start with `.`.
///
/// # Example
///
/// ```
/// use registry_mirror::core::types::RegistryName;
///
/// let name = RegistryName::new("validator-registry").unwrap();
/// assert_eq!(name.as_str(), "validator-registry");
///
/// assert!(RegistryName::new("").is_err());
/// assert!(RegistryName::new("a:b").is_err());
/// assert!(RegistryName::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryName(String);

impl RegistryName {
    /// Create a new validated registry name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Derive a registry name from a repository URL.
    ///
    /// Uses the last path segment with any `.git` suffix removed, so
    /// `https://github.com/cosmos/chain-registry.git` becomes `chain-registry`.
    ///
    /// # Example
    ///
    /// ```
    /// use registry_mirror::core::types::RegistryName;
    ///
    /// let name = RegistryName::from_url("https://github.com/cosmos/chain-registry").unwrap();
    /// assert_eq!(name.as_str(), "chain-registry");
    /// ```
    pub fn from_url(url: &str) -> Result<Self, TypeError> {
        let segment = url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or_default();
        let segment = segment.strip_suffix(".git").unwrap_or(segment);
        Self::new(segment).map_err(|_| {
            TypeError::InvalidRegistryName(format!("cannot derive a registry name from '{}'", url))
        })
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRegistryName(
                "registry name cannot be empty".into(),
            ));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidRegistryName(
                "registry name cannot start with '.'".into(),
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == ':' || *c == '/' || *c == '\\' || c.is_whitespace() || c.is_control())
        {
            return Err(TypeError::InvalidRegistryName(format!(
                "registry name cannot contain {:?}",
                c
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RegistryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegistryName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistryName> for String {
    fn from(name: RegistryName) -> Self {
        name.0
    }
}

/// A validated Git branch name.
///
/// A subset of Git's refname rules (see `git check-ref-format`):
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`
/// - Cannot end with `.lock` or `/`
/// - Cannot contain `..`, `@{`, `//`, whitespace, or `~^:\?*[`
///
/// # Example
///
/// ```
/// use registry_mirror::core::types::BranchName;
///
/// assert_eq!(BranchName::new("master").unwrap().as_str(), "master");
/// assert!(BranchName::new("release/v1").is_ok());
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let fail = |msg: &str| Err(TypeError::InvalidBranchName(msg.to_string()));

        if name.is_empty() {
            return fail("branch name cannot be empty");
        }
        if name == "@" {
            return fail("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return fail("branch name cannot start with '.' or '-'");
        }
        if name.ends_with(".lock") || name.ends_with('/') {
            return fail("branch name cannot end with '.lock' or '/'");
        }
        if name.contains("..") || name.contains("@{") || name.contains("//") {
            return fail("branch name cannot contain '..', '@{' or '//'");
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:\\?*[".contains(c))
        {
            return fail("branch name contains a forbidden character");
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The remote-tracking ref for this branch on `origin`.
    ///
    /// # Example
    ///
    /// ```
    /// use registry_mirror::core::types::BranchName;
    ///
    /// let branch = BranchName::new("master").unwrap();
    /// assert_eq!(branch.remote_ref(), "refs/remotes/origin/master");
    /// ```
    pub fn remote_ref(&self) -> String {
        format!("refs/remotes/origin/{}", self.0)
    }

    /// The local head ref for this branch.
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

/// A Git object identifier.
///
/// Accepts 40 (SHA-1) or 64 (SHA-256) hex characters and normalizes to
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into();
        let valid_len = oid.len() == 40 || oid.len() == 64;
        if !valid_len || !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(oid));
        }
        Ok(Self(oid.to_ascii_lowercase()))
    }

    /// Get the OID as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

/// A content hash of a published snapshot.
///
/// Covers the index order and every document's canonical JSON. Two
/// refreshes of an unchanged upstream produce the same fingerprint.
///
/// # Example
///
/// ```
/// use registry_mirror::core::document::ChainDocument;
/// use registry_mirror::core::types::Fingerprint;
///
/// let docs = vec![ChainDocument::new("cosmoshub")];
/// let a = Fingerprint::compute(&docs);
/// let b = Fingerprint::compute(&docs);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over documents in publication order.
    pub fn compute(documents: &[ChainDocument]) -> Self {
        let mut hasher = Sha256::new();
        for document in documents {
            hasher.update(document.path().as_bytes());
            hasher.update(b"\0");
            // serde_json maps are sorted, so this encoding is canonical.
            hasher.update(document.to_value().to_string().as_bytes());
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod registry_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(RegistryName::new("chain-registry").is_ok());
            assert!(RegistryName::new("validator_registry").is_ok());
            assert!(RegistryName::new("r1").is_ok());
        }

        #[test]
        fn rejects_separator_and_paths() {
            assert!(RegistryName::new("a:b").is_err());
            assert!(RegistryName::new("a/b").is_err());
            assert!(RegistryName::new("a\\b").is_err());
            assert!(RegistryName::new(".hidden").is_err());
            assert!(RegistryName::new("has space").is_err());
        }

        #[test]
        fn from_url_variants() {
            let cases = [
                ("https://github.com/cosmos/chain-registry", "chain-registry"),
                ("https://github.com/cosmos/chain-registry/", "chain-registry"),
                ("https://github.com/cosmos/chain-registry.git", "chain-registry"),
                ("git@github.com:eco-stake/validator-registry.git", "validator-registry"),
            ];
            for (url, expected) in cases {
                assert_eq!(RegistryName::from_url(url).unwrap().as_str(), expected, "{url}");
            }
        }

        #[test]
        fn from_url_without_segment_fails() {
            assert!(RegistryName::from_url("https://").is_err());
        }

        #[test]
        fn serde_roundtrip_validates() {
            let parsed: Result<RegistryName, _> = serde_json::from_str("\"bad:name\"");
            assert!(parsed.is_err());
        }
    }

    mod branch_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(BranchName::new("master").is_ok());
            assert!(BranchName::new("feature/x").is_ok());
            assert!(BranchName::new("user@feature").is_ok());
        }

        #[test]
        fn invalid_names() {
            for bad in ["", "@", ".x", "-x", "x.lock", "x/", "a..b", "a@{b", "a//b", "a b", "a:b"] {
                assert!(BranchName::new(bad).is_err(), "{bad:?} should be invalid");
            }
        }

        #[test]
        fn refs() {
            let b = BranchName::new("main").unwrap();
            assert_eq!(b.local_ref(), "refs/heads/main");
            assert_eq!(b.remote_ref(), "refs/remotes/origin/main");
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn accepts_sha1_and_sha256() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_ok());
        }

        #[test]
        fn normalizes_case() {
            let oid = Oid::new("ABCDEF".repeat(6) + "ABCD").unwrap();
            assert_eq!(oid.as_str(), "abcdef".repeat(6) + "abcd");
            assert_eq!(oid.short(7), "abcdefa");
        }

        #[test]
        fn rejects_bad_input() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("g".repeat(40)).is_err());
        }
    }

    mod fingerprint {
        use super::*;
        use serde_json::json;

        #[test]
        fn order_sensitive() {
            let a = ChainDocument::new("a");
            let b = ChainDocument::new("b");
            assert_ne!(
                Fingerprint::compute(&[a.clone(), b.clone()]),
                Fingerprint::compute(&[b, a])
            );
        }

        #[test]
        fn content_sensitive() {
            let mut one = ChainDocument::new("a");
            one.insert("chain", json!({"chain_id": "a-1"}));
            let mut two = ChainDocument::new("a");
            two.insert("chain", json!({"chain_id": "a-2"}));
            assert_ne!(Fingerprint::compute(&[one]), Fingerprint::compute(&[two]));
        }
    }
}
