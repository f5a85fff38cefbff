//! Project Configuration (nativebuilds.toml)
//!
//! Optional file at the project root. Every field has a default, so an
//! absent file behaves like an empty one.

use crate::{ConfigError, ConfigResult};
use nativebuilds_package::BuildTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Project configuration file name
pub const CONFIG_FILE: &str = "nativebuilds.toml";

/// Project configuration from nativebuilds.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Maven group of published artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Maven repository queried by the publication check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    /// Treat unexpected registry answers as "not published"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lenient_registry: Option<bool>,

    /// Target names (Kotlin target names, e.g. "iosArm64")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_splits: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_id: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_debug_builds: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishing: Option<bool>,

    /// package -> upstream version -> suffix appended when republishing
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub version_suffixes: BTreeMap<String, BTreeMap<String, String>>,

    /// package -> library -> libraries of the same package it links against
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sublibs: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(targets) = &self.targets {
            parse_targets(targets.iter().map(String::as_str))?;
        }
        if self.max_splits == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max-splits".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(group) = &self.group_id {
            if group.is_empty() || group.split('.').any(str::is_empty) {
                return Err(ConfigError::InvalidValue {
                    field: "group-id".to_string(),
                    reason: format!("invalid group '{}'", group),
                });
            }
        }
        Ok(())
    }
}

/// Parse target names, dropping duplicates while keeping the first
/// occurrence's position
pub fn parse_targets<'a>(names: impl IntoIterator<Item = &'a str>) -> ConfigResult<Vec<BuildTarget>> {
    let mut targets = Vec::new();
    for name in names {
        let target = BuildTarget::from_str(name.trim())?;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    Ok(targets)
}
