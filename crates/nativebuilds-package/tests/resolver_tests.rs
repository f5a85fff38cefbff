//! Dependency graph resolution tests against on-disk port trees

use nativebuilds_package::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_port(ports: &Path, json: &str) {
    let manifest = Manifest::from_str(json).unwrap();
    let dir = ports.join(&manifest.name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("vcpkg.json"), json).unwrap();
}

fn ports(manifests: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for json in manifests {
        write_port(dir.path(), json);
    }
    dir
}

fn root(json_deps: &str) -> Manifest {
    Manifest::from_str(&format!(
        r#"{{ "name": "root", "version-string": "0", "dependencies": {} }}"#,
        json_deps
    ))
    .unwrap()
}

fn resolve(ports: &TempDir, root: &Manifest) -> Result<BuildRegistry> {
    DependencyGraphResolver::new(ManifestStore::new(ports.path())).resolve(root)
}

fn features(registry: &BuildRegistry, name: &str) -> Vec<String> {
    registry
        .get(name)
        .unwrap_or_else(|| panic!("{} not resolved", name))
        .features
        .iter()
        .cloned()
        .collect()
}

const ZLIB: &str = r#"{
    "name": "zlib",
    "version": "1.3.1",
    "license": "Zlib",
    "default-features": ["static"],
    "features": {
        "shared": { "description": "Shared library" },
        "static": { "description": "Static library" }
    }
}"#;

const CURL: &str = r#"{
    "name": "curl",
    "version": "8.17.0",
    "license": "curl",
    "dependencies": [
        { "name": "zlib", "default-features": false, "features": ["shared"] },
        { "name": "vcpkg-cmake", "host": true }
    ],
    "default-features": ["ssl"],
    "features": {
        "ssl": {
            "description": "TLS",
            "dependencies": [{ "name": "curl", "features": ["openssl"] }]
        },
        "openssl": {
            "description": "OpenSSL backend",
            "dependencies": ["openssl"]
        },
        "http2": {
            "description": "HTTP/2",
            "dependencies": ["nghttp2", { "name": "pkgconf", "host": true }]
        }
    }
}"#;

const OPENSSL: &str = r#"{
    "name": "openssl",
    "version": "3.6.0",
    "license": "Apache-2.0",
    "dependencies": [{ "name": "vcpkg-cmake-config", "host": true }]
}"#;

const NGHTTP2: &str = r#"{ "name": "nghttp2", "version": "1.68.0", "license": "MIT" }"#;

fn standard_ports() -> TempDir {
    ports(&[ZLIB, CURL, OPENSSL, NGHTTP2])
}

mod contexts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_reference_without_defaults() {
        // curl's own reference to zlib opts out of defaults; curl is the root
        let dir = standard_ports();
        let curl = Manifest::from_str(CURL).unwrap();

        let registry = resolve(&dir, &curl).unwrap();
        assert_eq!(features(&registry, "zlib"), vec!["shared"]);
    }

    #[test]
    fn test_transitive_reference_activates_defaults() {
        let dir = standard_ports();
        let registry = resolve(&dir, &root(r#"["curl"]"#)).unwrap();

        assert_eq!(features(&registry, "zlib"), vec!["shared", "static"]);
        assert_eq!(features(&registry, "curl"), vec!["openssl", "ssl"]);
        assert!(registry.contains("openssl"));
    }

    #[test]
    fn test_opt_out_overridden_by_transitive_path() {
        // root opts out of zlib's defaults, but curl (a transitive reference
        // from zlib's point of view) still gets them activated
        let dir = standard_ports();
        let registry = resolve(
            &dir,
            &root(r#"[{ "name": "zlib", "default-features": false }, "curl"]"#),
        )
        .unwrap();
        assert_eq!(features(&registry, "zlib"), vec!["shared", "static"]);
    }

    #[test]
    fn test_root_opt_out_alone() {
        let dir = standard_ports();
        let registry = resolve(
            &dir,
            &root(r#"[{ "name": "zlib", "default-features": false }]"#),
        )
        .unwrap();
        assert!(features(&registry, "zlib").is_empty());
    }

    #[test]
    fn test_root_opt_out_of_curl_defaults() {
        let dir = standard_ports();
        let registry = resolve(
            &dir,
            &root(r#"[{ "name": "curl", "default-features": false, "features": ["http2"] }]"#),
        )
        .unwrap();

        assert_eq!(features(&registry, "curl"), vec!["http2"]);
        assert!(registry.contains("nghttp2"));
        assert!(!registry.contains("openssl"));
    }
}

mod host_exclusion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_host_dependencies_never_resolved() {
        // The host ports do not even exist on disk; loading them would fail
        let dir = standard_ports();
        let registry = resolve(
            &dir,
            &root(r#"["curl", { "name": "vcpkg-tool-meson", "host": true }]"#),
        )
        .unwrap();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["curl", "openssl", "zlib"]);
    }

    #[test]
    fn test_host_feature_dependencies_skipped() {
        let dir = standard_ports();
        let registry = resolve(
            &dir,
            &root(r#"[{ "name": "curl", "features": ["http2"] }]"#),
        )
        .unwrap();
        assert!(!registry.contains("pkgconf"));
        assert!(registry.contains("nghttp2"));
    }
}

mod merging {
    use super::*;
    use pretty_assertions::assert_eq;

    const P: &str = r#"{
        "name": "p",
        "version": "1",
        "license": "MIT",
        "default-features": ["base"],
        "features": {
            "base": { "description": "base" },
            "x": { "description": "x", "dependencies": [{ "name": "p", "features": ["x-core"] }] },
            "x-core": { "description": "x core" },
            "y": { "description": "y", "dependencies": ["extra"] }
        }
    }"#;
    const A: &str = r#"{ "name": "a", "version": "1", "license": "MIT", "dependencies": [{ "name": "p", "features": ["x"] }] }"#;
    const B: &str = r#"{ "name": "b", "version": "1", "license": "MIT", "dependencies": [{ "name": "p", "features": ["y"] }] }"#;
    const EXTRA: &str = r#"{ "name": "extra", "version": "1", "license": "MIT" }"#;

    #[test]
    fn test_union_of_activation_paths() {
        let dir = ports(&[P, A, B, EXTRA]);
        let registry = resolve(&dir, &root(r#"["a", "b"]"#)).unwrap();

        let p = Manifest::from_str(P).unwrap();
        let expected: BTreeSet<String> = p
            .resolve_features(["base", "x"])
            .unwrap()
            .union(&p.resolve_features(["base", "y"]).unwrap())
            .cloned()
            .collect();

        assert_eq!(registry.get("p").unwrap().features, expected);
    }

    #[test]
    fn test_grown_feature_set_is_re_expanded() {
        // p is first discovered without "y"; the later request for "y" must
        // still pull in "extra"
        let dir = ports(&[P, A, B, EXTRA]);
        let registry = resolve(&dir, &root(r#"["p", "b"]"#)).unwrap();

        assert!(registry.contains("extra"));
        assert_eq!(
            registry.dependencies_of("p").unwrap().iter().collect::<Vec<_>>(),
            vec!["extra"]
        );
    }

    #[test]
    fn test_output_is_sorted_by_name() {
        let dir = ports(&[P, A, B, EXTRA]);
        let registry = resolve(&dir, &root(r#"["b", "a"]"#)).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["a", "b", "extra", "p"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_discovery_order_does_not_matter(
            order in Just(vec![
                r#"{ "name": "p", "default-features": false, "features": ["x"] }"#,
                r#"{ "name": "p", "default-features": false, "features": ["y"] }"#,
                r#""a""#,
                r#""b""#,
            ]).prop_shuffle()
        ) {
            let dir = ports(&[P, A, B, EXTRA]);
            let shuffled = resolve(&dir, &root(&format!("[{}]", order.join(",")))).unwrap();
            let reference = resolve(&dir, &root(r#"["a", "b"]"#)).unwrap();

            let shuffled: Vec<(String, BTreeSet<String>)> =
                shuffled.iter().map(|p| (p.name.clone(), p.features.clone())).collect();
            let reference: Vec<(String, BTreeSet<String>)> =
                reference.iter().map(|p| (p.name.clone(), p.features.clone())).collect();
            prop_assert_eq!(shuffled, reference);
        }
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_missing_manifest_aborts() {
        let dir = ports(&[r#"{ "name": "a", "version": "1", "license": "MIT", "dependencies": ["ghost"] }"#]);
        let err = resolve(&dir, &root(r#"["a"]"#)).unwrap_err();
        assert!(matches!(err, PackageError::ManifestNotFound { name, .. } if name == "ghost"));
    }

    #[test]
    fn test_unknown_feature_aborts() {
        let dir = standard_ports();
        let err = resolve(&dir, &root(r#"[{ "name": "zlib", "features": ["brotli"] }]"#)).unwrap_err();
        assert!(matches!(err, PackageError::UnknownFeature { .. }));
    }

    #[test]
    fn test_unresolvable_license_aborts() {
        let dir = ports(&[r#"{ "name": "gpl", "version": "1", "license": "GPL-3.0-only" }"#]);
        let err = resolve(&dir, &root(r#"["gpl"]"#)).unwrap_err();
        assert!(matches!(err, PackageError::LicenseNotFound(id) if id == "GPL-3.0-only"));
    }

    #[test]
    fn test_missing_license_aborts() {
        let dir = ports(&[r#"{ "name": "anon", "version": "1" }"#]);
        assert!(matches!(
            resolve(&dir, &root(r#"["anon"]"#)),
            Err(PackageError::LicenseNotFound(_))
        ));
    }

    #[test]
    fn test_package_cycle_is_reported() {
        let dir = ports(&[
            r#"{ "name": "a", "version": "1", "license": "MIT", "dependencies": ["b"] }"#,
            r#"{ "name": "b", "version": "1", "license": "MIT", "dependencies": ["a"] }"#,
        ]);
        let err = resolve(&dir, &root(r#"["a"]"#)).unwrap_err();
        assert!(matches!(err, PackageError::CircularDependency(path) if path == "a -> b -> a"));
    }
}

mod platforms {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIB: &str = r#"{
        "name": "lib",
        "version": "1",
        "license": "MIT",
        "dependencies": [{ "name": "winonly", "platform": "windows" }, "zlib"],
        "default-features": [{ "name": "threads", "platform": "!windows" }],
        "features": { "threads": { "description": "threads" } }
    }"#;
    const WINONLY: &str = r#"{ "name": "winonly", "version": "1", "license": "MIT" }"#;

    #[test]
    fn test_any_platform_includes_everything() {
        let dir = ports(&[LIB, WINONLY, ZLIB]);
        let registry = resolve(&dir, &root(r#"["lib"]"#)).unwrap();
        assert!(registry.contains("winonly"));
        assert_eq!(features(&registry, "lib"), vec!["threads"]);
    }

    #[test]
    fn test_specific_platform_filters() {
        let dir = ports(&[LIB, WINONLY, ZLIB]);
        let linux = DependencyGraphResolver::new(ManifestStore::new(dir.path()))
            .with_platform(Platform::for_target(BuildTarget::LinuxX64))
            .resolve(&root(r#"["lib"]"#))
            .unwrap();
        assert!(!linux.contains("winonly"));
        assert_eq!(features(&linux, "lib"), vec!["threads"]);

        let mingw = DependencyGraphResolver::new(ManifestStore::new(dir.path()))
            .with_platform(Platform::for_target(BuildTarget::MingwX64))
            .resolve(&root(r#"["lib"]"#))
            .unwrap();
        assert!(mingw.contains("winonly"));
        assert!(features(&mingw, "lib").is_empty());
    }
}

#[test]
fn test_resolve_project_layout() {
    let dir = TempDir::new().unwrap();
    let ports_dir = dir.path().join("vcpkg").join("ports");
    write_port(&ports_dir, ZLIB);
    fs::write(
        dir.path().join("vcpkg.json"),
        r#"{ "name": "nativebuilds", "version-string": "0", "dependencies": ["zlib"] }"#,
    )
    .unwrap();

    let registry = DependencyGraphResolver::resolve_project(dir.path()).unwrap();
    let zlib = registry.get("zlib").unwrap();
    assert_eq!(zlib.version, "1.3.1");
    assert_eq!(zlib.license, License::Zlib);
    assert_eq!(registry.build_order().unwrap(), vec!["zlib"]);
}
