//! NativeBuilds package resolution
//!
//! Port manifest model (vcpkg.json), manifest loading, feature closure,
//! dependency graph resolution, licenses, build targets and the
//! publication check against the artifact registry.

pub mod features;
pub mod fsutil;
pub mod license;
pub mod manifest;
pub mod platform;
pub mod publish;
pub mod registry;
pub mod resolver;
pub mod snapshot;
pub mod store;
pub mod target;

pub use features::FeatureResolver;
pub use fsutil::write_if_different;
pub use license::License;
pub use manifest::{DefaultFeatureRef, DependencyRef, FeatureDef, Manifest};
pub use platform::{Platform, PlatformExpr};
pub use publish::{HttpRegistryClient, PublicationChecker, RegistryClient};
pub use registry::{BuildPackage, BuildRegistry};
pub use resolver::{Context, DependencyGraphResolver};
pub use snapshot::{PackageSnapshot, ResolutionSnapshot};
pub use store::ManifestStore;
pub use target::BuildTarget;

use std::path::PathBuf;

/// Package resolution errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Manifest for package '{name}' not found at {path}")]
    ManifestNotFound { name: String, path: PathBuf },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unknown feature '{feature}' in package '{package}'")]
    UnknownFeature { package: String, feature: String },

    #[error("License not found for id: {0}")]
    LicenseNotFound(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Invalid platform expression '{expr}': {reason}")]
    InvalidPlatformExpr { expr: String, reason: String },

    #[error("Unknown build target: {0}")]
    UnknownTarget(String),

    #[error("Registry lookup failed for {url}: {reason}")]
    RegistryLookup { url: String, reason: String },

    #[error("Library {package} was built in different versions on the build nodes: {versions:?}")]
    VersionMismatch {
        package: String,
        versions: Vec<String>,
    },

    #[error("Failed to parse snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl PackageError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create an unknown feature error
    pub fn unknown_feature(package: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::UnknownFeature {
            package: package.into(),
            feature: feature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
