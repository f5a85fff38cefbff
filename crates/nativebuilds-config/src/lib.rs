//! NativeBuilds Configuration
//!
//! Provides the settings of a packaging run:
//! - Project configuration (nativebuilds.toml)
//! - CI environment overrides (BUILD_TARGETS, MAX_SPLITS, ...)
//! - Host-dependent default targets and target sharding
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Project config (./nativebuilds.toml)
//! 3. Environment variables
//! 4. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use nativebuilds_config::{ConfigLoader, HostOs};
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! let targets = config.selected_targets(HostOs::current());
//! ```

pub mod host;
pub mod loader;
pub mod project;

use nativebuilds_package::PackageError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error(transparent)]
    Package(#[from] PackageError),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use host::HostOs;
pub use loader::{apply_env_overrides, shard, Config, ConfigLoader, DEFAULT_GROUP_ID};
pub use project::ProjectConfig;
