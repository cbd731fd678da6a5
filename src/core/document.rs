//! core::document
//!
//! Values published into the store.
//!
//! # Types
//!
//! - [`ChainDocument`] - Aggregated view of one directory's `.json` files
//! - [`CommitRecord`] - Provenance of the published snapshot
//! - [`RepositoryDescriptor`] - `{name, url, branch}` of the mirrored registry
//!
//! # Wire Shape
//!
//! A document serializes as a flat JSON object: the `path` field plus one
//! field per file basename. `path` always equals the directory name, even
//! when the directory holds a `path.json` file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{BranchName, Oid, RegistryName};

/// Aggregated JSON view of one registry directory.
///
/// # Example
///
/// ```
/// use registry_mirror::core::document::ChainDocument;
/// use serde_json::json;
///
/// let mut doc = ChainDocument::new("cosmoshub");
/// doc.insert("chain", json!({"chain_id": "cosmoshub-4"}));
///
/// assert_eq!(
///     doc.to_value(),
///     json!({"path": "cosmoshub", "chain": {"chain_id": "cosmoshub-4"}})
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDocument {
    path: String,
    files: Map<String, Value>,
}

impl ChainDocument {
    /// Create an empty document for a directory.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            files: Map::new(),
        }
    }

    /// The directory name this document was built from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Add a parsed file under its basename.
    ///
    /// A `path` basename is ignored; the directory name always wins.
    pub fn insert(&mut self, basename: impl Into<String>, value: Value) {
        let basename = basename.into();
        if basename != "path" {
            self.files.insert(basename, value);
        }
    }

    /// Look up a parsed file by basename.
    pub fn get(&self, basename: &str) -> Option<&Value> {
        self.files.get(basename)
    }

    /// Basenames of the files merged into this document.
    pub fn basenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// The flat JSON object written to the store.
    pub fn to_value(&self) -> Value {
        let mut object = self.files.clone();
        object.insert("path".to_string(), Value::String(self.path.clone()));
        Value::Object(object)
    }
}

impl Serialize for ChainDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChainDocument {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::deserialize(deserializer)?;
        let path = match object.remove("path") {
            Some(Value::String(path)) => path,
            _ => return Err(serde::de::Error::missing_field("path")),
        };
        Ok(Self {
            path,
            files: object,
        })
    }
}

/// Name and email of a commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

/// The branch tip a snapshot was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit object id
    pub oid: Oid,
    /// Commit author
    pub author: Signature,
    /// Committer (may differ from the author on rebased or merged commits)
    pub committer: Signature,
    /// Author time
    pub timestamp: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// First line of the message
    pub summary: String,
}

/// Persisted `{name, url, branch}` of a mirrored registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: RegistryName,
    pub url: String,
    pub branch: BranchName,
}
