//! Staging of shared libraries into wrapper projects
//!
//! Android targets get their shared libraries under `jniLibs/<abi>`, desktop
//! targets under JVM resources (`jni/<target>`) together with a generated
//! loader object that maps every target to its library file.

use crate::descriptor::quote;
use crate::error::{BuildError, BuildResult};
use crate::layout::{Layout, Linkage};
use nativebuilds_package::{write_if_different, BuildTarget};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Companion metadata path inside a source set's resources
pub const METADATA_FILE: &str = "META-INF/nativebuild.json";

const SHARED_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];
const IMPORT_LIB_SUFFIX: &str = ".dll.a";

/// Contents of `META-INF/nativebuild.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub package: String,
    pub lib: String,
}

/// Result of staging one library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedLibrary {
    /// Shared library files taken from the dynamic trees
    pub claimed: BTreeSet<PathBuf>,
    /// Runtime library file per desktop target name
    pub platform_files: BTreeMap<String, String>,
    /// Files created or rewritten
    pub written: usize,
}

pub struct SharedLibStager<'a> {
    layout: &'a Layout,
}

impl<'a> SharedLibStager<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Stage `lib` of `package` into `project_dir` for every target with
    /// dynamic libraries, skipping files in `exclude` (already claimed by a
    /// longer library name).
    pub fn stage(
        &self,
        package: &str,
        lib: &str,
        targets: &[BuildTarget],
        project_dir: &Path,
        exclude: &BTreeSet<PathBuf>,
    ) -> BuildResult<StagedLibrary> {
        let mut staged = StagedLibrary::default();

        for &target in targets.iter().filter(|t| t.has_dynamic_lib()) {
            let lib_dir = self
                .layout
                .target_dir(Linkage::Dynamic, package, target)
                .join("lib");
            let candidates = shared_library_candidates(&lib_dir, lib, exclude)?;
            if candidates.is_empty() {
                return Err(BuildError::missing(format!("shared library {}", lib), lib_dir));
            }

            for source in candidates {
                let file_name = file_name(&source);
                let dest = match target.android_abi() {
                    Some(abi) => project_dir
                        .join("src/androidMain/jniLibs")
                        .join(abi)
                        .join(&file_name),
                    None => {
                        if !file_name.ends_with(IMPORT_LIB_SUFFIX) {
                            if let Some(previous) = staged.platform_files.get(target.name()) {
                                return Err(BuildError::ambiguous(
                                    format!("shared library {} for {}", lib, target),
                                    [previous.clone(), file_name],
                                ));
                            }
                            staged
                                .platform_files
                                .insert(target.name().to_string(), file_name.clone());
                        }
                        project_dir
                            .join("src/jvmMain/resources/jni")
                            .join(target.name())
                            .join(&file_name)
                    }
                };

                let contents = fs::read(&source).map_err(|e| BuildError::io(&source, e))?;
                if write_if_different(&dest, &contents).map_err(|e| BuildError::io(&dest, e))? {
                    staged.written += 1;
                }
                debug!(from = %source.display(), to = %dest.display(), "staged shared library");
                staged.claimed.insert(source);
            }
        }

        staged.written += write_metadata(project_dir, package, lib)?;

        if targets.iter().any(|t| t.has_jvm_dynamic_lib()) {
            let class_name = jvm_lib_class_name(lib);
            let path = project_dir
                .join("src/jvmCommonMain/kotlin/com/ensody/nativebuilds")
                .join(kotlin_package_segment(package))
                .join(format!("{}.kt", class_name));
            let source = jvm_lib_source(package, lib, &staged.platform_files);
            if write_if_different(&path, source.as_bytes()).map_err(|e| BuildError::io(&path, e))? {
                staged.written += 1;
            }
        }

        info!(package, lib, files = staged.claimed.len(), "staged shared libraries");
        Ok(staged)
    }
}

/// Shared library files in `lib_dir` that belong to `lib`, sorted by name
pub fn shared_library_candidates(
    lib_dir: &Path,
    lib: &str,
    exclude: &BTreeSet<PathBuf>,
) -> BuildResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(lib_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(lib_dir, e)),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(lib_dir, e))?.path();
        if !path.is_file() || exclude.contains(&path) {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let shared = SHARED_EXTENSIONS.contains(&ext) || file_name(&path).ends_with(IMPORT_LIB_SUFFIX);
        if stem.starts_with(lib) && shared {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Write the companion metadata for the `jvm` and `android` source sets.
/// Returns the number of files changed.
pub fn write_metadata(project_dir: &Path, package: &str, lib: &str) -> BuildResult<usize> {
    let json = serde_json::to_string(&LibraryMetadata {
        package: package.to_string(),
        lib: lib.to_string(),
    })?;

    let mut written = 0;
    for variant in ["jvm", "android"] {
        let path = project_dir
            .join(format!("src/{}Main/resources", variant))
            .join(METADATA_FILE);
        if write_if_different(&path, json.as_bytes()).map_err(|e| BuildError::io(&path, e))? {
            written += 1;
        }
    }
    Ok(written)
}

/// `NativeBuildsJvmLib<Camel>` with the `lib` prefix dropped
pub fn jvm_lib_class_name(lib: &str) -> String {
    let base = lib.strip_prefix("lib").unwrap_or(lib);
    let camel: String = base
        .split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    format!("NativeBuildsJvmLib{}", camel)
}

/// Kotlin source of the JVM loader object
pub fn jvm_lib_source(package: &str, lib: &str, platform_files: &BTreeMap<String, String>) -> String {
    let entries: Vec<String> = platform_files
        .iter()
        .map(|(target, file)| format!("{} to {}", quote(target), quote(file)))
        .collect();
    format!(
        "package com.ensody.nativebuilds.{segment}\n\nimport com.ensody.nativebuilds.loader.NativeBuildsJvmLib\n\npublic object {class} : NativeBuildsJvmLib {{\n    override val packageName: String = {package}\n    override val libName: String = {lib}\n    override val platformFileName: Map<String, String> = mapOf({entries})\n}}\n",
        segment = kotlin_package_segment(package),
        class = jvm_lib_class_name(lib),
        package = quote(package),
        lib = quote(lib),
        entries = entries.join(", "),
    )
}

fn kotlin_package_segment(package: &str) -> String {
    package.to_lowercase().replace('-', "_")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
