//! Content fingerprints of output trees

use crate::error::{BuildError, BuildResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// SHA-256 over every file of `dir`: relative path, size and content, in
/// sorted path order. Two trees with equal fingerprints are byte-identical.
/// A missing directory fingerprints like an empty one.
pub fn tree_fingerprint(dir: &Path) -> BuildResult<String> {
    let mut hasher = Sha256::new();
    if !dir.exists() {
        return Ok(format!("{:x}", hasher.finalize()));
    }

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = fs::read(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;

        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
