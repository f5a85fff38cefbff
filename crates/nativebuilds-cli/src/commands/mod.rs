pub mod assemble;
pub mod check_published;
pub mod generate;
pub mod normalize;
pub mod package;
pub mod resolve;
pub mod targets;
pub mod triplets;

use anyhow::{Context, Result};
use nativebuilds_build::{Layout, VcpkgInstaller};
use nativebuilds_config::{Config, ConfigLoader, HostOs};
use nativebuilds_package::{
    BuildPackage, BuildRegistry, BuildTarget, DependencyGraphResolver, HttpRegistryClient,
    PublicationChecker,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs to know about the current project
pub struct Session {
    pub root: PathBuf,
    pub config: Config,
    pub host: HostOs,
    pub layout: Layout,
}

impl Session {
    /// Load configuration for the project containing `dir` (or the current
    /// directory)
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let start = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let config = ConfigLoader::new()
            .load_from_directory(&start)
            .context("Failed to load configuration")?;
        let root = config.project_root().map(Path::to_path_buf).unwrap_or(start);
        debug!(root = %root.display(), "project root");

        Ok(Self {
            layout: Layout::for_project(&root),
            host: HostOs::current(),
            root,
            config,
        })
    }

    /// Targets of this run's shard
    pub fn targets(&self) -> Vec<BuildTarget> {
        self.config.selected_targets(self.host)
    }

    /// Resolve the project's dependency graph with version suffixes applied
    pub fn registry(&self) -> Result<BuildRegistry> {
        let mut registry = DependencyGraphResolver::resolve_project(&self.root)
            .context("Failed to resolve dependencies")?;
        registry.apply_version_suffixes(&self.config.version_suffixes);
        Ok(registry)
    }

    /// Installer for the vcpkg checkout, defaulting to `<root>/vcpkg/vcpkg`
    pub fn installer(&self, vcpkg: Option<&Path>) -> VcpkgInstaller {
        match vcpkg {
            Some(path) => VcpkgInstaller::new(path, &self.root),
            None => VcpkgInstaller::for_project(&self.root),
        }
    }

    /// Publication lookups against the configured Maven registry
    pub fn publication_checker(&self) -> Result<PublicationChecker<HttpRegistryClient>> {
        let client = HttpRegistryClient::new().context("Failed to create registry client")?;
        Ok(
            PublicationChecker::new(client, &self.config.registry_url, &self.config.group_id)
                .lenient(self.config.lenient_registry),
        )
    }
}

/// Packages of `registry` in dependency-first order
pub fn ordered_packages(registry: &BuildRegistry) -> Result<Vec<&BuildPackage>> {
    let order = registry.build_order()?;
    Ok(order.iter().filter_map(|name| registry.get(name)).collect())
}
