//! Post-build normalization of installer output
//!
//! Turns one raw installed tree (`<pkg>_<triplet>/{lib,include,bin,debug}`)
//! into the canonical packaged layout of a single package, target and
//! linkage:
//!
//! - symlinked library files collapse into one physical file under the
//!   shortest name
//! - static trees keep `include/` and `lib/`; dynamic trees keep `lib/` plus
//!   the DLLs from `bin/`, relocated into `lib/`
//! - `debug/` is kept only when requested; pkgconfig folders never are
//! - a fixed rename table resolves known library name collisions
//!
//! The output tree is only written where content differs, so normalizing an
//! already-normalized tree performs no writes.

use crate::error::{BuildError, BuildResult};
use crate::layout::{Layout, Linkage};
use nativebuilds_package::{write_if_different, BuildTarget};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Library files whose installed name collides with another package's
pub const COLLISION_RENAMES: &[(&str, &str)] = &[("libzlib.a", "libz.a"), ("libzlib.so", "libz.so")];

/// Directories never copied into a normalized tree
const EXCLUDED_DIRS: &[&str] = &["lib/pkgconfig", "debug/lib/pkgconfig"];

/// One (package, target, linkage) normalization unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeJob {
    pub package: String,
    pub target: BuildTarget,
    pub linkage: Linkage,
    /// Raw installed tree
    pub source: PathBuf,
    /// Normalized output tree
    pub dest: PathBuf,
}

impl NormalizeJob {
    /// Job for the conventional layout; `None` when the target has no
    /// variant of `linkage`
    pub fn for_layout(
        layout: &Layout,
        linkage: Linkage,
        target: BuildTarget,
        package: &str,
    ) -> Option<Self> {
        let triplet = linkage.triplet(target)?;
        Some(Self {
            package: package.to_string(),
            target,
            linkage,
            source: layout.raw_package_dir(linkage, target, package, &triplet),
            dest: layout.target_dir(linkage, package, target),
        })
    }
}

/// What a normalization run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Symlink aliases removed from the raw tree
    pub collapsed_links: usize,
    /// Output files created or rewritten
    pub written: usize,
    /// Output files already up to date
    pub unchanged: usize,
    /// Stale output files deleted
    pub removed: usize,
}

impl NormalizeReport {
    /// Whether the run left every file untouched
    pub fn is_noop(&self) -> bool {
        self.collapsed_links == 0 && self.written == 0 && self.removed == 0
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactNormalizer {
    include_debug: bool,
    renames: BTreeMap<String, String>,
}

impl ArtifactNormalizer {
    pub fn new(include_debug: bool) -> Self {
        Self {
            include_debug,
            renames: COLLISION_RENAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Add an entry to the collision rename table
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn include_debug(&self) -> bool {
        self.include_debug
    }

    /// Normalize one job
    pub fn normalize(&self, job: &NormalizeJob) -> BuildResult<NormalizeReport> {
        if !job.source.is_dir() {
            return Err(BuildError::missing(
                format!("{}_{}", job.package, job.target),
                &job.source,
            ));
        }

        let mut report = NormalizeReport::default();
        for lib_dir in self.lib_dirs(&job.source) {
            report.collapsed_links += collapse_symlinks(&lib_dir)?;
        }

        let plan = self.plan(&job.source, job.linkage)?;
        for (rel, source) in &plan {
            let dest = job.dest.join(rel);
            let contents = fs::read(source).map_err(|e| BuildError::io(source, e))?;
            if write_if_different(&dest, &contents).map_err(|e| BuildError::io(&dest, e))? {
                debug!(file = %dest.display(), "wrote");
                report.written += 1;
            } else {
                report.unchanged += 1;
            }
        }

        report.removed = remove_unplanned(&job.dest, &plan)?;

        info!(
            package = %job.package,
            target = %job.target,
            linkage = %job.linkage,
            written = report.written,
            removed = report.removed,
            collapsed = report.collapsed_links,
            "normalized"
        );
        Ok(report)
    }

    /// Normalize independent jobs in parallel. Every job owns its output
    /// subtree, so jobs must not share a `dest`.
    pub fn normalize_all(&self, jobs: &[NormalizeJob]) -> BuildResult<Vec<NormalizeReport>> {
        jobs.par_iter().map(|job| self.normalize(job)).collect()
    }

    fn lib_dirs(&self, source: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![source.join("lib")];
        if self.include_debug {
            dirs.push(source.join("debug").join("lib"));
        }
        dirs.into_iter().filter(|dir| dir.is_dir()).collect()
    }

    /// Map of output path (relative) to the raw file providing it
    fn plan(&self, source: &Path, linkage: Linkage) -> BuildResult<BTreeMap<PathBuf, PathBuf>> {
        let mut plan: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() || entry.path().is_dir() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(source) else {
                continue;
            };
            let Some(dest) = self.destination(rel, linkage) else {
                continue;
            };

            if let Some(previous) = plan.get(&dest) {
                return Err(BuildError::ambiguous(
                    dest.display().to_string(),
                    [previous.display().to_string(), entry.path().display().to_string()],
                ));
            }
            plan.insert(dest, entry.path().to_path_buf());
        }

        Ok(plan)
    }

    /// Where a raw file lands in the normalized tree, if anywhere
    fn destination(&self, rel: &Path, linkage: Linkage) -> Option<PathBuf> {
        if EXCLUDED_DIRS.iter().any(|dir| rel.starts_with(dir)) {
            return None;
        }

        let top = match rel.components().next() {
            Some(Component::Normal(top)) => top.to_str()?,
            _ => return None,
        };
        let file_name = rel.file_name()?.to_str()?;

        let dest = match top {
            "lib" => rel.to_path_buf(),
            "include" if linkage == Linkage::Static => rel.to_path_buf(),
            "bin" if linkage == Linkage::Dynamic && rel.extension().is_some_and(|ext| ext == "dll") => {
                Path::new("lib").join(file_name)
            }
            "debug" if self.include_debug => rel.to_path_buf(),
            _ => return None,
        };

        let parent = dest.parent()?;
        if parent == Path::new("lib") || parent == Path::new("debug/lib") {
            if let Some(renamed) = self.renames.get(file_name) {
                return Some(parent.join(renamed));
            }
        }
        Some(dest)
    }
}

/// Replace every symlink group in `lib_dir` by one physical file.
///
/// Links are grouped by the file they resolve to. The shortest name in the
/// group (links plus the real file when it lives in `lib_dir`; ties broken
/// lexicographically) receives the real file, every other name is deleted.
/// Dangling links are deleted. Returns the number of links removed.
pub fn collapse_symlinks(lib_dir: &Path) -> BuildResult<usize> {
    let canonical_dir = fs::canonicalize(lib_dir).map_err(|e| BuildError::io(lib_dir, e))?;

    let mut removed = 0;
    let mut groups: BTreeMap<PathBuf, BTreeSet<(usize, String)>> = BTreeMap::new();
    let entries = fs::read_dir(lib_dir).map_err(|e| BuildError::io(lib_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(lib_dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if !file_type.is_symlink() {
            continue;
        }
        let canonical = match fs::canonicalize(&path) {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(link = %path.display(), "removing dangling symlink");
                fs::remove_file(&path).map_err(|e| BuildError::io(&path, e))?;
                removed += 1;
                continue;
            }
            Err(e) => return Err(BuildError::io(&path, e)),
        };
        if canonical.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        groups
            .entry(canonical)
            .or_default()
            .insert((name.len(), name));
    }

    for (canonical, mut names) in groups {
        let real_name = match (canonical.parent(), canonical.file_name()) {
            (Some(parent), Some(name)) if parent == canonical_dir => {
                Some(name.to_string_lossy().into_owned())
            }
            _ => None,
        };
        if let Some(real_name) = &real_name {
            names.insert((real_name.len(), real_name.clone()));
        }

        let Some((_, best)) = names.pop_first() else {
            continue;
        };
        let best_path = lib_dir.join(&best);

        if real_name.as_deref() != Some(best.as_str()) {
            fs::remove_file(&best_path).map_err(|e| BuildError::io(&best_path, e))?;
            fs::rename(&canonical, &best_path).map_err(|e| BuildError::io(&canonical, e))?;
        }

        for (_, alias) in names {
            if real_name.as_deref() == Some(alias.as_str()) {
                // Already moved to the best name
                continue;
            }
            let alias_path = lib_dir.join(&alias);
            fs::remove_file(&alias_path).map_err(|e| BuildError::io(&alias_path, e))?;
            removed += 1;
        }
        if real_name.as_deref() != Some(best.as_str()) {
            removed += 1;
        }
        debug!(dir = %lib_dir.display(), kept = %best, "collapsed symlink group");
    }

    Ok(removed)
}

/// Delete output files not in `plan` and prune empty directories.
/// Returns the number of files deleted.
fn remove_unplanned(dest: &Path, plan: &BTreeMap<PathBuf, PathBuf>) -> BuildResult<usize> {
    if !dest.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(dest).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            let empty = fs::read_dir(path)
                .map_err(|e| BuildError::io(path, e))?
                .next()
                .is_none();
            if empty {
                fs::remove_dir(path).map_err(|e| BuildError::io(path, e))?;
            }
            continue;
        }

        let planned = path
            .strip_prefix(dest)
            .map(|rel| plan.contains_key(rel))
            .unwrap_or(false);
        if !planned {
            fs::remove_file(path).map_err(|e| BuildError::io(path, e))?;
            debug!(file = %path.display(), "removed stale file");
            removed += 1;
        }
    }
    Ok(removed)
}
