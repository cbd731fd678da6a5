//! registry-mirror - mirror git-backed chain registries into a key-value store
//!
//! A registry is a git repository with one directory per chain, each holding
//! JSON files (`chain.json`, `assetlist.json`, ...). The mirror keeps a fresh
//! working copy of the tracked branch, folds every eligible chain directory
//! into a single JSON document and publishes it, together with an index, the
//! latest commit and a repository descriptor, to a document store.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates one refresh: Lock → Sync → Filter → Publish
//! - [`core`] - Domain types, registry descriptors, configuration and locks
//! - [`git`] - Shallow clone, fetch and checkout of working copies
//! - [`allowlist`] - Remote list of chains admitted by name
//! - [`aggregate`] - Directory enumeration, filtering and document building
//! - [`publish`] - Ordered writes of a snapshot to the store
//! - [`store`] - Document store abstraction (memory, file, RedisJSON)
//! - [`report`] - Error reporting hook for failed refreshes
//! - [`ui`] - Output formatting and logging setup
//!
//! # Correctness Invariants
//!
//! 1. At most one refresh per registry runs at a time
//! 2. The `paths` index is written only after every document it names
//! 3. A failed refresh leaves the previous `commit` and `repository` entries
//! 4. Every failure is reported with the registry name and never escapes
//!    [`engine::RegistrySyncEngine::refresh`]

pub mod aggregate;
pub mod allowlist;
pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod publish;
pub mod report;
pub mod store;
pub mod ui;
