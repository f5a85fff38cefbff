//! Manifest loading with a per-run cache

use crate::manifest::Manifest;
use crate::{PackageError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File name of every manifest
pub const MANIFEST_FILE: &str = "vcpkg.json";

/// Loads port manifests by package name and caches them.
///
/// A store is meant to live for one resolution run; nothing is persisted.
#[derive(Debug)]
pub struct ManifestStore {
    ports_dir: PathBuf,
    cache: HashMap<String, Arc<Manifest>>,
}

impl ManifestStore {
    /// Store reading `<ports_dir>/<name>/vcpkg.json`
    pub fn new(ports_dir: impl Into<PathBuf>) -> Self {
        Self {
            ports_dir: ports_dir.into(),
            cache: HashMap::new(),
        }
    }

    /// Store for a project checkout with vcpkg as a subdirectory
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join("vcpkg").join("ports"))
    }

    /// Load the project's own manifest (`<root>/vcpkg.json`)
    pub fn load_root(root: &Path) -> Result<Manifest> {
        let path = root.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(PackageError::ManifestNotFound {
                name: root.display().to_string(),
                path,
            });
        }
        Manifest::from_file(&path)
    }

    pub fn ports_dir(&self) -> &Path {
        &self.ports_dir
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.ports_dir.join(name).join(MANIFEST_FILE)
    }

    /// Load a package manifest, reading it from disk at most once
    pub fn load(&mut self, name: &str) -> Result<Arc<Manifest>> {
        if let Some(manifest) = self.cache.get(name) {
            return Ok(Arc::clone(manifest));
        }

        let path = self.manifest_path(name);
        if !path.is_file() {
            return Err(PackageError::ManifestNotFound {
                name: name.to_string(),
                path,
            });
        }
        debug!(package = name, path = %path.display(), "loading manifest");
        let manifest = Manifest::from_file(&path)?;
        if manifest.name != name {
            warn!(
                package = name,
                declared = %manifest.name,
                "manifest name differs from its port directory"
            );
        }

        let manifest = Arc::new(manifest);
        self.cache.insert(name.to_string(), Arc::clone(&manifest));
        Ok(manifest)
    }

    /// Register an already parsed manifest under its own name
    pub fn insert(&mut self, manifest: Manifest) -> Arc<Manifest> {
        let manifest = Arc::new(manifest);
        self.cache
            .insert(manifest.name.clone(), Arc::clone(&manifest));
        manifest
    }

    /// Number of manifests loaded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached manifest
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
