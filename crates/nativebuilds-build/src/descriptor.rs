//! Gradle build descriptors for packaged libraries
//!
//! One `build.gradle.kts` is generated per library of a package (and per
//! debug variant). Output depends only on the inputs, so regenerating an
//! unchanged library rewrites nothing.

use crate::error::{BuildError, BuildResult};
use crate::layout::{Layout, Linkage};
use nativebuilds_package::{write_if_different, BuildTarget, License};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of generated descriptors
pub const DESCRIPTOR_FILE: &str = "build.gradle.kts";

/// Extensions that identify a library file in a `lib/` directory
const LIBRARY_EXTENSIONS: &[&str] = &["a", "lib", "so", "dylib", "dll"];

/// Which normalized tree a descriptor binds against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    pub linkage: Linkage,
    pub debug: bool,
}

impl Variant {
    pub const RELEASE: Variant = Variant {
        linkage: Linkage::Static,
        debug: false,
    };
    pub const DEBUG: Variant = Variant {
        linkage: Linkage::Static,
        debug: true,
    };

    /// Library directory inside a target tree
    pub fn lib_dir(&self) -> &'static str {
        if self.debug {
            "debug/lib"
        } else {
            "lib"
        }
    }
}

/// Everything a descriptor is generated from
#[derive(Debug, Clone)]
pub struct LibraryDescriptor {
    pub package: String,
    pub lib: String,
    pub version: String,
    pub license: License,
    pub targets: Vec<BuildTarget>,
    pub variant: Variant,
    /// Other libraries of the same package this library links against
    pub lib_dependencies: Vec<String>,
    /// Static library file name per target
    pub static_libraries: BTreeMap<BuildTarget, String>,
}

impl LibraryDescriptor {
    /// Collect the static library file of every native target from the
    /// normalized layout
    #[allow(clippy::too_many_arguments)]
    pub fn from_layout(
        layout: &Layout,
        package: &str,
        lib: &str,
        version: &str,
        license: License,
        targets: &[BuildTarget],
        variant: Variant,
        lib_dependencies: Vec<String>,
    ) -> BuildResult<Self> {
        let targets = native_targets(targets);
        let mut static_libraries = BTreeMap::new();
        for &target in &targets {
            let dir = layout
                .target_dir(variant.linkage, package, target)
                .join(variant.lib_dir());
            static_libraries.insert(target, static_library_file(&dir, lib)?);
        }

        Ok(Self {
            package: package.to_string(),
            lib: lib.to_string(),
            version: version.to_string(),
            license,
            targets,
            variant,
            lib_dependencies,
            static_libraries,
        })
    }

    /// Gradle project name: `<pkg>-<lib>[--debug]`
    pub fn project_name(&self) -> String {
        let suffix = if self.variant.debug { "--debug" } else { "" };
        format!("{}-{}{}", self.package, self.lib, suffix)
    }
}

#[derive(Debug, Clone)]
pub struct BuildScriptGenerator {
    wrappers_path: String,
}

impl Default for BuildScriptGenerator {
    fn default() -> Self {
        Self::new("generated-kotlin-wrappers")
    }
}

impl BuildScriptGenerator {
    /// `wrappers_path` is the wrappers directory relative to the Gradle root
    pub fn new(wrappers_path: impl Into<String>) -> Self {
        Self {
            wrappers_path: wrappers_path.into(),
        }
    }

    /// Render the descriptor text
    pub fn generate(&self, desc: &LibraryDescriptor) -> BuildResult<String> {
        let targets = native_targets(&desc.targets);
        let has_android = targets.iter().any(|t| t.android_abi().is_some());
        let has_jvm = targets.iter().any(|t| t.has_jvm_dynamic_lib());
        let has_dynamic = targets.iter().any(|t| t.has_dynamic_lib());

        let mut out = String::new();
        out.push_str("import com.ensody.buildlogic.setupBuildLogic\n");
        out.push_str("import com.vanniktech.maven.publish.MavenPublishBaseExtension\n");
        out.push_str("import org.jetbrains.kotlin.gradle.plugin.mpp.KotlinNativeTarget\n\n");

        out.push_str("plugins {\n");
        if has_android {
            out.push_str("    id(\"com.ensody.build-logic.android\")\n");
        }
        out.push_str("    id(\"com.ensody.build-logic.kmp\")\n");
        out.push_str("    id(\"com.ensody.build-logic.publish\")\n");
        out.push_str("}\n\n");

        out.push_str(&format!("version = {}\n\n", quote(&desc.version)));

        out.push_str("setupBuildLogic {\n    kotlin {\n");
        for target in &targets {
            out.push_str(&format!("        {}()\n", target.name()));
        }
        if has_jvm {
            out.push_str("        jvm()\n");
        }
        if has_android {
            out.push_str("        androidTarget()\n");
        }

        if has_dynamic {
            let source_set = match (has_jvm, has_android) {
                (false, _) => "android",
                (true, false) => "jvm",
                (true, true) => "jvmCommon",
            };
            out.push_str(&format!(
                "\n        sourceSets[\"{0}Main\"].dependencies {{\n            api(libs.nativebuilds.loader)\n        }}\n        sourceSets[\"{0}Test\"].dependencies {{\n            implementation(libs.kotlin.test.junit)\n            implementation(libs.junit)\n        }}\n",
                source_set
            ));
        }

        out.push_str("\n        tasks.register(\"testAll\") {\n");
        if desc.lib_dependencies.is_empty() && !targets.is_empty() {
            let tasks: Vec<String> = targets
                .iter()
                .map(|t| quote(&format!("linkDebugTest{}", upper_first(t.name()))))
                .collect();
            out.push_str(&format!("            dependsOn({})\n", tasks.join(", ")));
        }
        out.push_str("        }\n");

        let project = desc.project_name();
        let interop_package = format!(
            "com.ensody.nativebuilds.kotlin.wrapper.{}",
            format!("{}-{}", desc.package, desc.lib).replace('-', ".")
        );
        for target in &targets {
            let static_lib = desc.static_libraries.get(target).ok_or_else(|| {
                BuildError::missing(
                    format!("static library {} for {}", desc.lib, target),
                    self.target_path(desc, *target),
                )
            })?;
            let root = self.target_path(desc, *target);
            out.push_str(&format!(
                "\n        targets.getByName<KotlinNativeTarget>({target}).compilations.getByName(\"main\").cinterops.create({name}) {{\n            extraOpts(\"-libraryPath\", rootDir.resolve({lib_dir}).absolutePath)\n            extraOpts(\"-staticLibrary\", {file})\n            includeDirs(rootDir.resolve({include_dir}))\n            val cinteropFile = project.file(\"cinterop.def\")\n            if (cinteropFile.exists()) {{\n                definitionFile.set(cinteropFile)\n            }}\n            packageName = {package}\n        }}\n",
                target = quote(target.name()),
                name = quote(&project),
                lib_dir = quote(&format!("{}/{}", root, desc.variant.lib_dir())),
                file = quote(static_lib),
                include_dir = quote(&format!("{}/include", root)),
                package = quote(&interop_package),
            ));
        }
        out.push_str("    }\n}\n\n");

        out.push_str(&format!(
            "extensions.configure<MavenPublishBaseExtension> {{\n    pom {{\n        licenses {{\n            license {{\n                name.set({})\n                url.set({})\n            }}\n        }}\n    }}\n}}\n",
            quote(desc.license.display_name()),
            quote(desc.license.url()),
        ));

        Ok(out)
    }

    /// Render and write `<dir>/build.gradle.kts`; returns `true` if the file
    /// changed
    pub fn write(&self, desc: &LibraryDescriptor, dir: &Path) -> BuildResult<bool> {
        let text = self.generate(desc)?;
        let path = dir.join(DESCRIPTOR_FILE);
        let changed =
            write_if_different(&path, text.as_bytes()).map_err(|e| BuildError::io(&path, e))?;
        debug!(file = %path.display(), changed, "descriptor");
        Ok(changed)
    }

    fn target_path(&self, desc: &LibraryDescriptor, target: BuildTarget) -> String {
        format!(
            "{}/{}/{}/libs/{}",
            self.wrappers_path.trim_end_matches('/'),
            desc.variant.linkage.dir_name(),
            desc.package,
            target.name()
        )
    }
}

/// Native targets in canonical target order without duplicates
fn native_targets(targets: &[BuildTarget]) -> Vec<BuildTarget> {
    targets
        .iter()
        .copied()
        .filter(BuildTarget::is_native)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The one existing file of `<lib>.a` / `<lib>.lib` in `lib_dir`
pub fn static_library_file(lib_dir: &Path, lib: &str) -> BuildResult<String> {
    let mut candidates: Vec<String> = ["a", "lib"]
        .iter()
        .map(|ext| format!("{}.{}", lib, ext))
        .filter(|name| lib_dir.join(name).is_file())
        .collect();

    if candidates.len() > 1 {
        return Err(BuildError::ambiguous(format!("static library {}", lib), candidates));
    }
    candidates
        .pop()
        .ok_or_else(|| BuildError::missing(format!("static library {}", lib), lib_dir))
}

/// Library names found in `lib_dir`, longest first (ties by name)
pub fn library_names(lib_dir: &Path) -> BuildResult<Vec<String>> {
    let entries = match fs::read_dir(lib_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(lib_dir, e)),
    };

    let mut names = BTreeSet::new();
    for entry in entries {
        let path: PathBuf = entry.map_err(|e| BuildError::io(lib_dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !LIBRARY_EXTENSIONS.contains(&ext) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.insert(stem.to_string());
        }
    }

    let mut names: Vec<String> = names.into_iter().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    Ok(names)
}

/// Kotlin string literal
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
