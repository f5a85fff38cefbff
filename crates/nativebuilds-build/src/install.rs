//! Native package manager invocation

use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Builds and installs the project's dependencies for one triplet
pub trait Installer {
    /// Install into `packages_root`, producing one `<pkg>_<triplet>`
    /// directory per package
    fn install(&self, triplet: &str, overlay_dir: &Path, packages_root: &Path) -> BuildResult<()>;
}

/// Runs `vcpkg install` in manifest mode
#[derive(Debug, Clone)]
pub struct VcpkgInstaller {
    executable: PathBuf,
    project_root: PathBuf,
}

impl VcpkgInstaller {
    pub fn new(executable: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            project_root: project_root.into(),
        }
    }

    /// `<root>/vcpkg/vcpkg`
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join("vcpkg").join("vcpkg"), root)
    }

    /// Installer's triplet directory
    pub fn triplets_dir(&self) -> PathBuf {
        self.executable
            .parent()
            .map(|dir| dir.join("triplets"))
            .unwrap_or_else(|| PathBuf::from("triplets"))
    }

    /// Arguments passed for one install
    pub fn args(&self, triplet: &str, overlay_dir: &Path, packages_root: &Path) -> Vec<String> {
        vec![
            "install".to_string(),
            format!("--overlay-triplets={}", overlay_dir.display()),
            "--triplet".to_string(),
            triplet.to_string(),
            "--x-packages-root".to_string(),
            packages_root.display().to_string(),
        ]
    }
}

impl Installer for VcpkgInstaller {
    fn install(&self, triplet: &str, overlay_dir: &Path, packages_root: &Path) -> BuildResult<()> {
        info!(triplet, root = %packages_root.display(), "installing");
        let status = Command::new(&self.executable)
            .args(self.args(triplet, overlay_dir, packages_root))
            .current_dir(&self.project_root)
            .status()
            .map_err(|e| BuildError::io(&self.executable, e))?;

        if !status.success() {
            return Err(BuildError::InstallFailed {
                triplet: triplet.to_string(),
                reason: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let installer = VcpkgInstaller::for_project(Path::new("/p"));
        assert_eq!(
            installer.args("x64-linux", Path::new("/o"), Path::new("/b/static/linuxX64")),
            vec![
                "install",
                "--overlay-triplets=/o",
                "--triplet",
                "x64-linux",
                "--x-packages-root",
                "/b/static/linuxX64",
            ]
        );
        assert_eq!(installer.triplets_dir(), PathBuf::from("/p/vcpkg/triplets"));
    }

    #[test]
    fn test_missing_executable() {
        let installer = VcpkgInstaller::new("/nonexistent/vcpkg", "/");
        assert!(matches!(
            installer.install("x64-linux", Path::new("/o"), Path::new("/r")),
            Err(BuildError::Io { .. })
        ));
    }
}
