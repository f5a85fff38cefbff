//! On-disk locations of raw build output and packaged wrappers

use nativebuilds_package::BuildTarget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Link mode of a build variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Static,
    Dynamic,
}

impl Linkage {
    pub const ALL: [Linkage; 2] = [Linkage::Static, Linkage::Dynamic];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }

    /// Installer triplet for `target`, `None` when the target has no
    /// dynamic variant
    pub fn triplet(&self, target: BuildTarget) -> Option<String> {
        match self {
            Self::Static => Some(target.triplet().to_string()),
            Self::Dynamic => target.dynamic_triplet(),
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Root directories of a packaging run
#[derive(Debug, Clone)]
pub struct Layout {
    /// Raw per-target installer output
    pub build_dir: PathBuf,
    /// Normalized trees, descriptors and snapshots
    pub wrappers_dir: PathBuf,
}

impl Layout {
    pub fn new(build_dir: impl Into<PathBuf>, wrappers_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: build_dir.into(),
            wrappers_dir: wrappers_dir.into(),
        }
    }

    /// Conventional layout under a project root
    pub fn for_project(root: &Path) -> Self {
        Self::new(
            root.join("build").join("nativebuilds"),
            root.join("generated-kotlin-wrappers"),
        )
    }

    /// `--x-packages-root` for one linkage and target
    pub fn packages_root(&self, linkage: Linkage, target: BuildTarget) -> PathBuf {
        self.build_dir.join(linkage.dir_name()).join(target.name())
    }

    /// Raw installed tree of one package: `<build>/<linkage>/<target>/<pkg>_<triplet>`
    pub fn raw_package_dir(
        &self,
        linkage: Linkage,
        target: BuildTarget,
        package: &str,
        triplet: &str,
    ) -> PathBuf {
        self.packages_root(linkage, target)
            .join(format!("{}_{}", package, triplet))
    }

    /// `<wrappers>/<linkage>/<pkg>/libs`
    pub fn package_libs_dir(&self, linkage: Linkage, package: &str) -> PathBuf {
        self.wrappers_dir
            .join(linkage.dir_name())
            .join(package)
            .join("libs")
    }

    /// Normalized tree of one package and target
    pub fn target_dir(&self, linkage: Linkage, package: &str, target: BuildTarget) -> PathBuf {
        self.package_libs_dir(linkage, package).join(target.name())
    }

    /// Wrapper project of one library: `<wrappers>/static/<pkg>-<lib>[--debug]`
    pub fn wrapper_project_dir(&self, package: &str, lib: &str, debug: bool) -> PathBuf {
        let suffix = if debug { "--debug" } else { "" };
        self.wrappers_dir
            .join(Linkage::Static.dir_name())
            .join(format!("{}-{}{}", package, lib, suffix))
    }

    /// Where release archives are written
    pub fn artifacts_dir(&self) -> PathBuf {
        self.build_dir.join("artifacts")
    }

    pub fn overlay_triplets_dir(&self) -> PathBuf {
        self.build_dir.join("overlay-triplets")
    }

    /// Targets that have a normalized tree for `package`, in target order
    pub fn packaged_targets(&self, linkage: Linkage, package: &str) -> Vec<BuildTarget> {
        let libs = self.package_libs_dir(linkage, package);
        BuildTarget::ALL
            .iter()
            .copied()
            .filter(|target| libs.join(target.name()).is_dir())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/b", "/w");
        assert_eq!(
            layout.raw_package_dir(Linkage::Dynamic, BuildTarget::LinuxX64, "zlib", "x64-linux-dynamic"),
            PathBuf::from("/b/dynamic/linuxX64/zlib_x64-linux-dynamic")
        );
        assert_eq!(
            layout.target_dir(Linkage::Static, "zlib", BuildTarget::IosArm64),
            PathBuf::from("/w/static/zlib/libs/iosArm64")
        );
        assert_eq!(
            layout.wrapper_project_dir("openssl", "libcrypto", true),
            PathBuf::from("/w/static/openssl-libcrypto--debug")
        );
    }

    #[test]
    fn test_linkage_triplet() {
        assert_eq!(
            Linkage::Static.triplet(BuildTarget::LinuxX64).as_deref(),
            Some("x64-linux")
        );
        assert_eq!(Linkage::Dynamic.triplet(BuildTarget::IosArm64), None);
    }

    #[test]
    fn test_packaged_targets_follow_target_order() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path().join("b"), dir.path().join("w"));
        for target in [BuildTarget::LinuxX64, BuildTarget::IosArm64] {
            std::fs::create_dir_all(layout.target_dir(Linkage::Static, "zlib", target)).unwrap();
        }
        assert_eq!(
            layout.packaged_targets(Linkage::Static, "zlib"),
            vec![BuildTarget::IosArm64, BuildTarget::LinuxX64]
        );
    }
}
