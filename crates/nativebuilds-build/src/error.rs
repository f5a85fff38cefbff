//! Packaging error types

use nativebuilds_package::PackageError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Multiple candidates for {what}: {}", candidates.join(", "))]
    AmbiguousArtifact {
        what: String,
        candidates: Vec<String>,
    },

    #[error("Missing artifact {what} in {}", dir.display())]
    MissingArtifact { what: String, dir: PathBuf },

    #[error("Install of {triplet} failed: {reason}")]
    InstallFailed { triplet: String, reason: String },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to encode metadata: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Package(#[from] PackageError),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create an ambiguous artifact error
    pub fn ambiguous<I, S>(what: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AmbiguousArtifact {
            what: what.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a missing artifact error
    pub fn missing(what: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            what: what.into(),
            dir: dir.into(),
        }
    }
}

impl From<walkdir::Error> for BuildError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let error = err.into_io_error().unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
        });
        Self::Io { path, error }
    }
}
