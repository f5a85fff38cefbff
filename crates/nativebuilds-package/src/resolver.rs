//! Dependency graph resolution
//!
//! Walks a root manifest's dependencies and produces one [`BuildPackage`]
//! per reachable package, with the union of every feature request that
//! reached it. Resolution is a worklist iteration to a fixed point: a
//! package is (re)expanded whenever it is created or its feature set grows,
//! so the result does not depend on discovery order.

use crate::features::FeatureResolver;
use crate::license::License;
use crate::manifest::{DependencyRef, Manifest};
use crate::platform::Platform;
use crate::registry::{BuildPackage, BuildRegistry};
use crate::store::ManifestStore;
use crate::Result;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// How a dependency reference was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Direct dependency of the manifest under resolution
    Root,
    /// Reached through another package's dependencies or features
    Transitive,
}

impl Context {
    /// Root references honor `default-features: false`; transitive
    /// references always activate the defaults.
    pub fn activates_defaults(self, dep: &DependencyRef) -> bool {
        match self {
            Self::Root => dep.use_default_features,
            Self::Transitive => true,
        }
    }
}

#[derive(Debug)]
struct PendingPackage {
    manifest: Arc<Manifest>,
    license: License,
    features: BTreeSet<String>,
}

/// Resolves a manifest's dependency graph into a [`BuildRegistry`].
///
/// The resolver owns its [`ManifestStore`], so the manifest cache lives
/// exactly as long as one run.
#[derive(Debug)]
pub struct DependencyGraphResolver {
    store: ManifestStore,
    platform: Platform,
    packages: BTreeMap<String, PendingPackage>,
    edges: BTreeMap<String, BTreeSet<String>>,
    pending: VecDeque<String>,
    queued: HashSet<String>,
}

impl DependencyGraphResolver {
    pub fn new(store: ManifestStore) -> Self {
        Self {
            store,
            platform: Platform::Any,
            packages: BTreeMap::new(),
            edges: BTreeMap::new(),
            pending: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    /// Restrict platform-qualified entries to a platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Resolve the project at `root` (`<root>/vcpkg.json` with ports in
    /// `<root>/vcpkg/ports`)
    pub fn resolve_project(root: &Path) -> Result<BuildRegistry> {
        let manifest = ManifestStore::load_root(root)?;
        Self::new(ManifestStore::for_project(root)).resolve(&manifest)
    }

    /// Resolve every package reachable from `root`.
    ///
    /// Any load or feature error aborts the whole run.
    pub fn resolve(mut self, root: &Manifest) -> Result<BuildRegistry> {
        info!(root = %root.name, "resolving dependency graph");

        for dep in &root.dependencies {
            if dep.name == root.name {
                continue;
            }
            self.activate(dep, Context::Root)?;
        }

        while let Some(name) = self.pending.pop_front() {
            self.queued.remove(&name);
            for dep in self.effective_dependencies(&name)? {
                self.edges
                    .entry(name.clone())
                    .or_default()
                    .insert(dep.name.clone());
                self.activate(&dep, Context::Transitive)?;
            }
        }

        self.finish()
    }

    /// Register a reference, creating the package or growing its features
    fn activate(&mut self, dep: &DependencyRef, context: Context) -> Result<()> {
        if dep.host {
            debug!(package = %dep.name, "skipping host dependency");
            return Ok(());
        }
        if !self.platform.matches(dep.platform.as_deref())? {
            debug!(package = %dep.name, platform = ?dep.platform, "dependency not active on platform");
            return Ok(());
        }

        let manifest = self.store.load(&dep.name)?;
        let mut requested = Vec::new();
        if context.activates_defaults(dep) {
            for feature in &manifest.default_features {
                if self.platform.matches(feature.platform.as_deref())? {
                    requested.push(feature.name.clone());
                }
            }
        }
        for feature in &dep.features {
            if self.platform.matches(feature.platform.as_deref())? {
                requested.push(feature.name.clone());
            }
        }
        let features = FeatureResolver::new(&self.platform).resolve(&manifest, requested)?;

        match self.packages.entry(dep.name.clone()) {
            Entry::Vacant(entry) => {
                let license = License::from_id(manifest.license.as_deref().unwrap_or(""))?;
                debug!(package = %dep.name, ?context, ?features, "discovered package");
                entry.insert(PendingPackage {
                    manifest,
                    license,
                    features,
                });
            }
            Entry::Occupied(mut entry) => {
                let pkg = entry.get_mut();
                let before = pkg.features.len();
                pkg.features.extend(features);
                if pkg.features.len() == before {
                    return Ok(());
                }
                debug!(package = %dep.name, features = ?pkg.features, "merged feature request");
            }
        }

        self.enqueue(&dep.name);
        Ok(())
    }

    fn enqueue(&mut self, name: &str) {
        if self.queued.insert(name.to_string()) {
            self.pending.push_back(name.to_string());
        }
    }

    /// Base dependencies plus those of every active feature, without host
    /// tools, self references and inactive platforms
    fn effective_dependencies(&self, name: &str) -> Result<Vec<DependencyRef>> {
        let Some(pkg) = self.packages.get(name) else {
            return Ok(Vec::new());
        };
        let manifest = &pkg.manifest;

        let feature_deps = pkg
            .features
            .iter()
            .filter_map(|feature| manifest.feature(feature))
            .flat_map(|def| def.dependencies.iter());

        let mut deps = Vec::new();
        for dep in manifest.dependencies.iter().chain(feature_deps) {
            if dep.host || dep.name == manifest.name || dep.name == name {
                continue;
            }
            if self.platform.matches(dep.platform.as_deref())? {
                deps.push(dep.clone());
            }
        }
        Ok(deps)
    }

    fn finish(self) -> Result<BuildRegistry> {
        let packages = self
            .packages
            .into_iter()
            .map(|(name, pending)| {
                let pkg = BuildPackage {
                    name: name.clone(),
                    version: pending.manifest.version.clone(),
                    features: pending.features,
                    license: pending.license,
                    manifest: pending.manifest,
                };
                (name, pkg)
            })
            .collect();

        let registry = BuildRegistry::new(packages, self.edges);
        registry.build_order()?;
        info!(packages = registry.len(), "dependency graph resolved");
        Ok(registry)
    }
}
