//! Resolution snapshots shared between build shards
//!
//! Every shard writes `pkg-<os>-<split>.json` next to its outputs. The
//! publishing run reads them all back and refuses to publish when shards
//! disagree about a package version.

use crate::fsutil::write_if_different;
use crate::license::License;
use crate::registry::BuildRegistry;
use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub name: String,
    pub version: String,
    pub features: Vec<String>,
    pub license: License,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionSnapshot {
    pub packages: Vec<PackageSnapshot>,
}

impl ResolutionSnapshot {
    pub fn from_registry(registry: &BuildRegistry) -> Self {
        Self {
            packages: registry
                .iter()
                .map(|pkg| PackageSnapshot {
                    name: pkg.name.clone(),
                    version: pkg.version.clone(),
                    features: pkg.features.iter().cloned().collect(),
                    license: pkg.license,
                })
                .collect(),
        }
    }

    pub fn file_name(os: &str, split_id: usize) -> String {
        format!("pkg-{}-{}.json", os, split_id)
    }

    /// Write as pretty JSON; returns `true` if the file changed
    pub fn write(&self, path: &Path) -> Result<bool> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        write_if_different(path, json.as_bytes()).map_err(|e| PackageError::io(path, e))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PackageError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| PackageError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read every `pkg-*.json` in `dir`, ordered by file name
    pub fn read_all(dir: &Path) -> Result<Vec<Self>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PackageError::io(dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PackageError::io(dir, e))?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("pkg-") && name.ends_with(".json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|path| Self::read(path)).collect()
    }

    /// Check that every package has one version across all snapshots and
    /// return the agreed versions
    pub fn check_consistent(snapshots: &[Self]) -> Result<BTreeMap<String, String>> {
        let mut versions: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for snapshot in snapshots {
            for pkg in &snapshot.packages {
                versions.entry(&pkg.name).or_default().insert(&pkg.version);
            }
        }

        let mut agreed = BTreeMap::new();
        for (name, set) in versions {
            if set.len() != 1 {
                return Err(PackageError::VersionMismatch {
                    package: name.to_string(),
                    versions: set.into_iter().map(str::to_string).collect(),
                });
            }
            if let Some(version) = set.into_iter().next() {
                agreed.insert(name.to_string(), version.to_string());
            }
        }
        Ok(agreed)
    }
}
