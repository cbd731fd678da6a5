//! aggregate::document
//!
//! Builds the [`ChainDocument`] for one candidate directory.
//!
//! Every immediate `*.json` file is parsed and stored under its file name
//! without the extension. A file that cannot be read or parsed leaves its
//! key absent and is logged; only a directory that cannot be listed fails
//! the build.

use std::fs;
use std::path::Path;

use crate::core::document::ChainDocument;

use super::{Candidate, FilesystemError};

/// Build the document for `candidate`, blocking on file I/O.
pub fn build_document(candidate: &Candidate) -> Result<ChainDocument, FilesystemError> {
    let entries = fs::read_dir(&candidate.dir).map_err(|e| FilesystemError::DocumentBuild {
        dir: candidate.name.clone(),
        message: format!("cannot list {}: {}", candidate.dir.display(), e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FilesystemError::DocumentBuild {
            dir: candidate.name.clone(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut document = ChainDocument::new(candidate.name.as_str());
    for path in files {
        let Some(basename) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(file = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };
        if let Some(value) = read_json(&path) {
            document.insert(basename, value);
        }
    }
    Ok(document)
}

/// Build on the blocking pool.
pub async fn build_document_async(candidate: Candidate) -> Result<ChainDocument, FilesystemError> {
    let name = candidate.name.clone();
    tokio::task::spawn_blocking(move || build_document(&candidate))
        .await
        .map_err(|e| FilesystemError::DocumentBuild {
            dir: name,
            message: format!("build task failed: {}", e),
        })?
}

fn read_json(path: &Path) -> Option<serde_json::Value> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "unreadable file, key left absent");
            return None;
        }
    };
    match serde_json::from_slice(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "malformed JSON, key left absent");
            None
        }
    }
}
