//! Overlay triplets for release-only and dynamically linked builds

use crate::error::{BuildError, BuildResult};
use nativebuilds_package::{write_if_different, BuildTarget};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const RELEASE_ONLY: &str = "\nset(VCPKG_BUILD_TYPE release)\n";
const DYNAMIC_LINKAGE: &str = "\nset(VCPKG_CRT_LINKAGE dynamic)\nset(VCPKG_LIBRARY_LINKAGE dynamic)\n";

/// Writes overlay triplets derived from the installer's own triplet files
#[derive(Debug, Clone)]
pub struct OverlayTriplets {
    triplets_dir: PathBuf,
    overlay_dir: PathBuf,
}

impl OverlayTriplets {
    /// `triplets_dir` is the installer's `triplets/` directory (with its
    /// `community/` subdirectory)
    pub fn new(triplets_dir: impl Into<PathBuf>, overlay_dir: impl Into<PathBuf>) -> Self {
        Self {
            triplets_dir: triplets_dir.into(),
            overlay_dir: overlay_dir.into(),
        }
    }

    pub fn overlay_dir(&self) -> &Path {
        &self.overlay_dir
    }

    /// Write the overlays of every target; returns the number of files that
    /// changed
    pub fn write(&self, targets: &[BuildTarget]) -> BuildResult<usize> {
        let mut changed = 0;
        for target in targets {
            let base = self.read_base(target.triplet())?;
            changed += self.write_overlay(target.triplet(), &base, RELEASE_ONLY)?;

            if let (Some(base_dynamic), Some(dynamic)) =
                (target.base_dynamic_triplet(), target.dynamic_triplet())
            {
                let base = self.read_base(base_dynamic)?;
                changed += self.write_overlay(&dynamic, &base, DYNAMIC_LINKAGE)?;
            }
        }
        Ok(changed)
    }

    /// Base triplet file, community triplets first
    pub fn find_base(&self, triplet: &str) -> BuildResult<PathBuf> {
        let file = format!("{}.cmake", triplet);
        [self.triplets_dir.join("community"), self.triplets_dir.clone()]
            .into_iter()
            .map(|dir| dir.join(&file))
            .find(|path| path.is_file())
            .ok_or_else(|| BuildError::missing(format!("triplet {}", triplet), &self.triplets_dir))
    }

    fn read_base(&self, triplet: &str) -> BuildResult<String> {
        let path = self.find_base(triplet)?;
        fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))
    }

    fn write_overlay(&self, triplet: &str, base: &str, suffix: &str) -> BuildResult<usize> {
        let path = self.overlay_dir.join(format!("{}.cmake", triplet));
        let contents = format!("{}{}", base, suffix);
        let changed =
            write_if_different(&path, contents.as_bytes()).map_err(|e| BuildError::io(&path, e))?;
        debug!(triplet, changed, "overlay triplet");
        Ok(usize::from(changed))
    }
}
