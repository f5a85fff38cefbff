//! Deterministic `.tar.gz` archives of normalized target trees

use crate::error::{BuildError, BuildResult};
use crate::layout::{Layout, Linkage};
use flate2::write::GzEncoder;
use flate2::Compression;
use nativebuilds_package::{write_if_different, BuildTarget};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tracing::info;
use walkdir::WalkDir;

const PKGCONFIG_DIRS: &[&str] = &["lib/pkgconfig", "debug/lib/pkgconfig"];

/// Archive file name: `<pkg>[-headers]-<target>.tar.gz`
pub fn archive_name(package: &str, target: BuildTarget, headers: bool) -> String {
    let kind = if headers { "-headers" } else { "" };
    format!(
        "{}{}-{}.tar.gz",
        package,
        kind,
        target.name().to_lowercase()
    )
}

/// Archive `include/`, `lib/` and `debug/` of a target tree (no pkgconfig).
/// Returns `true` if `out` changed.
pub fn archive_target(tree: &Path, out: &Path) -> BuildResult<bool> {
    archive(tree, out, |rel| {
        top_level(rel).is_some_and(|top| matches!(top, "include" | "lib" | "debug"))
            && !PKGCONFIG_DIRS.iter().any(|dir| rel.starts_with(dir))
    })
}

/// Archive only `include/` of a target tree
pub fn archive_headers(tree: &Path, out: &Path) -> BuildResult<bool> {
    archive(tree, out, |rel| top_level(rel) == Some("include"))
}

/// Archive every static target tree of `package` into the artifacts
/// directory; returns the written archive paths
pub fn archive_package(layout: &Layout, package: &str) -> BuildResult<Vec<PathBuf>> {
    let out_dir = layout.artifacts_dir();
    let mut archives = Vec::new();
    for target in layout.packaged_targets(Linkage::Static, package) {
        let tree = layout.target_dir(Linkage::Static, package, target);

        let full = out_dir.join(archive_name(package, target, false));
        archive_target(&tree, &full)?;
        archives.push(full);

        let headers = out_dir.join(archive_name(package, target, true));
        archive_headers(&tree, &headers)?;
        archives.push(headers);
    }
    info!(package, archives = archives.len(), "archived");
    Ok(archives)
}

fn top_level(rel: &Path) -> Option<&str> {
    match rel.components().next() {
        Some(Component::Normal(top)) => top.to_str(),
        _ => None,
    }
}

fn archive(tree: &Path, out: &Path, include: impl Fn(&Path) -> bool) -> BuildResult<bool> {
    let bytes = archive_bytes(tree, include)?;
    write_if_different(out, &bytes).map_err(|e| BuildError::io(out, e))
}

/// Build the archive in memory: sorted entries, zero mtime/uid/gid and
/// fixed modes, so equal trees give equal bytes
fn archive_bytes(tree: &Path, include: impl Fn(&Path) -> bool) -> BuildResult<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in WalkDir::new(tree).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(tree) else {
            continue;
        };
        if !include(rel) {
            continue;
        }

        let content = fs::read(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        builder
            .append_data(&mut header, rel, content.as_slice())
            .map_err(|e| BuildError::io(entry.path(), e))?;
    }

    let encoder = builder.into_inner().map_err(|e| BuildError::io(tree, e))?;
    encoder.finish().map_err(|e: io::Error| BuildError::io(tree, e))
}
