//! core
//!
//! Core domain types, schemas, and guards for the registry mirror.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RegistryName, BranchName, Oid, Fingerprint
//! - [`document`] - Published records: ChainDocument, CommitRecord, RepositoryDescriptor
//! - [`registry`] - Registry descriptors, layout variants and allowlist policies
//! - [`lock`] - Single-flight and cross-process working-copy locks
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Schemas are strict and self-describing
//! - Nothing here performs network I/O

pub mod config;
pub mod document;
pub mod lock;
pub mod registry;
pub mod types;
