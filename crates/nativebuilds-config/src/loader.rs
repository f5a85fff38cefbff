//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::host::HostOs;
use crate::project::{parse_targets, ProjectConfig, CONFIG_FILE};
use crate::ConfigResult;
use nativebuilds_package::publish::DEFAULT_REGISTRY_URL;
use nativebuilds_package::BuildTarget;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default Maven group of published artifacts
pub const DEFAULT_GROUP_ID: &str = "com.ensody.nativebuilds";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Project config (./nativebuilds.toml) - overrides defaults
/// 3. Environment variables - overrides project
/// 4. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip reading the process environment
    ignore_env: bool,
}

/// Merged configuration result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub group_id: String,
    pub registry_url: String,
    pub lenient_registry: bool,

    /// Explicit target selection; `None` means the host defaults
    pub targets: Option<Vec<BuildTarget>>,

    pub max_splits: usize,
    pub split_id: usize,
    pub include_debug_builds: bool,
    pub publishing: bool,
    pub version_suffixes: BTreeMap<String, BTreeMap<String, String>>,
    pub sublibs: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Project root directory (where nativebuilds.toml was found)
    pub project_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_id: DEFAULT_GROUP_ID.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            lenient_registry: false,
            targets: None,
            max_splits: 1,
            split_id: 0,
            include_debug_builds: false,
            publishing: false,
            version_suffixes: BTreeMap::new(),
            sublibs: BTreeMap::new(),
            project_root: None,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not consult environment variables
    pub fn ignore_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find nativebuilds.toml. Without one the
    /// built-in defaults apply.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = find_project_config(start_dir)?;
        self.finish(project, project_root)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(Path::to_path_buf);
        self.finish(project, project_root)
    }

    fn finish(&self, project: ProjectConfig, project_root: Option<PathBuf>) -> ConfigResult<Config> {
        let mut config = Config::from_project(project)?;
        config.project_root = project_root;
        if !self.ignore_env {
            apply_env_overrides(&mut config, |key| env::var(key).ok())?;
        }
        Ok(config)
    }
}

/// Find project configuration by walking up directory tree
fn find_project_config(start_dir: &Path) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);

        if config_path.exists() {
            debug!(path = %config_path.display(), "loading project config");
            let project_config = ProjectConfig::load_from_file(&config_path)?;
            return Ok((Some(current), project_config));
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Ok((None, ProjectConfig::default())),
        }
    }
}

/// Apply CI environment overrides
///
/// Unset or blank variables leave the value untouched. Unparsable numbers
/// fall back to the defaults; unknown target names are an error.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(targets) = var("BUILD_TARGETS") {
        config.targets = Some(parse_targets(targets.split(','))?);
    }
    if let Some(splits) = var("MAX_SPLITS") {
        match splits.trim().parse::<usize>() {
            Ok(n) => config.max_splits = n.max(1),
            Err(_) => {
                warn!(value = %splits, "unparsable MAX_SPLITS, using 1");
                config.max_splits = 1;
            }
        }
    }
    if let Some(id) = var("BUILD_SPLIT_ID") {
        match id.trim().parse::<usize>() {
            Ok(n) => config.split_id = n,
            Err(_) => {
                warn!(value = %id, "unparsable BUILD_SPLIT_ID, using 0");
                config.split_id = 0;
            }
        }
    }
    if let Some(debug) = var("INCLUDE_DEBUG_BUILDS") {
        config.include_debug_builds = debug.trim() == "true";
    }
    if let Some(publishing) = var("PUBLISHING") {
        config.publishing = publishing.trim() == "true";
    }
    Ok(())
}

impl Config {
    /// Merge a project file over the built-in defaults
    pub fn from_project(project: ProjectConfig) -> ConfigResult<Self> {
        let defaults = Self::default();
        let targets = match &project.targets {
            Some(names) => Some(parse_targets(names.iter().map(String::as_str))?),
            None => None,
        };
        Ok(Self {
            group_id: project.group_id.unwrap_or(defaults.group_id),
            registry_url: project.registry_url.unwrap_or(defaults.registry_url),
            lenient_registry: project.lenient_registry.unwrap_or(false),
            targets,
            max_splits: project.max_splits.unwrap_or(1).max(1),
            split_id: project.split_id.unwrap_or(0),
            include_debug_builds: project.include_debug_builds.unwrap_or(false),
            publishing: project.publishing.unwrap_or(false),
            version_suffixes: project.version_suffixes,
            sublibs: project.sublibs,
            project_root: None,
        })
    }

    /// Targets of this run: the configured list (or the host defaults),
    /// narrowed to this run's shard
    pub fn selected_targets(&self, host: HostOs) -> Vec<BuildTarget> {
        let all = match &self.targets {
            Some(targets) => targets.clone(),
            None => host.default_targets(),
        };
        shard(&all, self.max_splits, self.split_id).to_vec()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }
}

/// Contiguous slice `id` of `splits` roughly equal parts
///
/// The last shard (and any id past it) runs to the end of `items`.
pub fn shard<T>(items: &[T], splits: usize, id: usize) -> &[T] {
    let splits = splits.max(1);
    let n = items.len();
    let chunk = n / splits;
    let start = chunk.saturating_mul(id).min(n);
    let end = if id >= splits - 1 {
        n
    } else {
        (chunk * (id + 1)).min(n)
    };
    &items[start..end]
}
