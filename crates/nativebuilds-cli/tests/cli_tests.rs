//! CLI integration tests against temporary project checkouts

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

const ENV_VARS: [&str; 7] = [
    "BUILD_TARGETS",
    "MAX_SPLITS",
    "BUILD_SPLIT_ID",
    "INCLUDE_DEBUG_BUILDS",
    "PUBLISHING",
    "NATIVEBUILDS_JSON",
    "NATIVEBUILDS_PROJECT_DIR",
];

fn nativebuilds(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nativebuilds").unwrap();
    for key in ENV_VARS {
        cmd.env_remove(key);
    }
    cmd.env("RUST_LOG", "warn").current_dir(dir);
    cmd
}

fn write(path: PathBuf, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_project(dir: &Path) {
    write(
        dir.join("vcpkg.json"),
        r#"{ "name": "nativebuilds", "version-string": "0", "dependencies": ["zlib"] }"#,
    );
    write(
        dir.join("vcpkg/ports/zlib/vcpkg.json"),
        r#"{
            "name": "zlib",
            "version": "1.3.1",
            "license": "Zlib",
            "default-features": ["static"],
            "features": { "static": { "description": "Static library" } }
        }"#,
    );
}

fn create_linux_build_output(dir: &Path) {
    let build = dir.join("build/nativebuilds");
    let static_tree = build.join("static/linuxX64/zlib_x64-linux");
    write(static_tree.join("include/zlib.h"), "header");
    write(static_tree.join("lib/libz.a"), "archive");
    write(static_tree.join("lib/pkgconfig/zlib.pc"), "pc");
    write(
        build.join("dynamic/linuxX64/zlib_x64-linux-dynamic/lib/libz.so"),
        "shared",
    );
}

fn snapshots(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir.join("generated-kotlin-wrappers"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            let name = path.file_name().unwrap().to_string_lossy();
            name.starts_with("pkg-") && name.ends_with(".json")
        })
        .collect();
    found.sort();
    found
}

// ============================================================================
// Help and Targets
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    nativebuilds(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("check-published"))
        .stdout(predicate::str::contains("BUILD_TARGETS"));
}

#[test]
fn test_targets_shard_from_env() {
    let temp = TempDir::new().unwrap();
    let output = nativebuilds(temp.path())
        .args(["targets", "--json"])
        .env("BUILD_TARGETS", "linuxX64,iosArm64,mingwX64")
        .env("MAX_SPLITS", "2")
        .env("BUILD_SPLIT_ID", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let targets: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(targets, vec!["iosArm64", "mingwX64"]);
}

#[test]
fn test_targets_from_config_file() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path().join("nativebuilds.toml"),
        r#"targets = ["androidNativeArm64"]"#,
    );

    nativebuilds(temp.path())
        .arg("targets")
        .assert()
        .success()
        .stdout("androidNativeArm64\tarm64-android\n");
}

#[test]
fn test_unknown_target_fails() {
    let temp = TempDir::new().unwrap();
    nativebuilds(temp.path())
        .arg("targets")
        .env("BUILD_TARGETS", "linuxX64,vax")
        .assert()
        .failure()
        .stderr(predicate::str::contains("vax"));
}

// ============================================================================
// Resolve
// ============================================================================

#[test]
fn test_resolve_writes_snapshot() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());

    nativebuilds(temp.path())
        .arg("resolve")
        .assert()
        .success()
        .stdout("zlib 1.3.1 [static] Zlib\n");

    let found = snapshots(temp.path());
    assert_eq!(found.len(), 1);
    let name = found[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("-0.json"), "{}", name);

    let snapshot: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&found[0]).unwrap()).unwrap();
    assert_eq!(snapshot[0]["name"], "zlib");
    assert_eq!(snapshot[0]["license"], "Zlib");
}

#[test]
fn test_resolve_applies_version_suffix() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    write(
        temp.path().join("nativebuilds.toml"),
        "[version-suffixes.zlib]\n\"1.3.1\" = \".2\"\n",
    );

    nativebuilds(temp.path())
        .args(["resolve", "--no-snapshot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zlib 1.3.1.2"));
    assert!(!temp.path().join("generated-kotlin-wrappers").exists());
}

#[test]
fn test_resolve_unknown_feature_fails() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    write(
        temp.path().join("vcpkg.json"),
        r#"{ "name": "nativebuilds", "version-string": "0",
             "dependencies": [{ "name": "zlib", "features": ["brotli"] }] }"#,
    );

    nativebuilds(temp.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("brotli"));
}

#[test]
fn test_publishing_rejects_inconsistent_shards() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    nativebuilds(temp.path()).arg("resolve").assert().success();
    write(
        temp.path().join("generated-kotlin-wrappers/pkg-Elsewhere-7.json"),
        r#"[{ "name": "zlib", "version": "1.2.13", "features": [], "license": "Zlib" }]"#,
    );

    nativebuilds(temp.path())
        .arg("resolve")
        .env("PUBLISHING", "true")
        .assert()
        .failure()
        .stderr(predicate::str::contains("zlib"));

    // Without publishing mode the foreign snapshot is left alone
    nativebuilds(temp.path()).arg("resolve").assert().success();
}

#[test]
fn test_publishing_does_not_write_snapshot() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    write(
        temp.path().join("generated-kotlin-wrappers/pkg-Linux-0.json"),
        r#"[{ "name": "zlib", "version": "1.3.1", "features": ["static"], "license": "Zlib" }]"#,
    );

    nativebuilds(temp.path())
        .arg("resolve")
        .env("PUBLISHING", "true")
        .assert()
        .success()
        .stdout("zlib 1.3.1 [static] Zlib\n");
    assert_eq!(snapshots(temp.path()).len(), 1);

    let empty = TempDir::new().unwrap();
    create_project(empty.path());
    nativebuilds(empty.path())
        .arg("resolve")
        .env("PUBLISHING", "true")
        .assert()
        .success();
    assert!(!empty.path().join("generated-kotlin-wrappers").exists());
}

// ============================================================================
// Normalize, Generate, Package
// ============================================================================

#[test]
fn test_normalize_generate_package() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    create_linux_build_output(temp.path());
    let wrappers = temp.path().join("generated-kotlin-wrappers");

    nativebuilds(temp.path())
        .arg("normalize")
        .env("BUILD_TARGETS", "linuxX64")
        .assert()
        .success()
        .stdout("Normalized 2 tree(s): 3 written, 0 unchanged, 0 removed, 0 link(s) collapsed\n");

    assert!(wrappers.join("static/zlib/libs/linuxX64/lib/libz.a").is_file());
    assert!(wrappers.join("static/zlib/libs/linuxX64/include/zlib.h").is_file());
    assert!(!wrappers.join("static/zlib/libs/linuxX64/lib/pkgconfig").exists());
    assert!(wrappers.join("dynamic/zlib/libs/linuxX64/lib/libz.so").is_file());

    nativebuilds(temp.path())
        .arg("normalize")
        .env("BUILD_TARGETS", "linuxX64")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 written, 3 unchanged"));

    nativebuilds(temp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Not publishing"));
    assert!(!wrappers.join("static/zlib-libz").exists());

    // Nothing listens on the discard port, which lenient mode reads as unpublished
    write(
        temp.path().join("nativebuilds.toml"),
        "registry-url = \"http://127.0.0.1:9\"\nlenient-registry = true\n",
    );
    nativebuilds(temp.path())
        .arg("generate")
        .env("PUBLISHING", "true")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("zlib: libz (1 script(s)"));

    let script = fs::read_to_string(wrappers.join("static/zlib-libz/build.gradle.kts")).unwrap();
    assert!(script.contains("linuxX64()"));
    assert!(wrappers
        .join("static/zlib-libz/src/jvmMain/resources/jni/linuxX64/libz.so")
        .is_file());

    nativebuilds(temp.path())
        .arg("package")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2 archive(s)"));
    assert!(temp
        .path()
        .join("build/nativebuilds/artifacts/zlib-linuxx64.tar.gz")
        .is_file());
}

#[test]
fn test_normalize_without_build_output_fails() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());

    nativebuilds(temp.path())
        .arg("normalize")
        .env("BUILD_TARGETS", "linuxX64")
        .assert()
        .failure()
        .stderr(predicate::str::contains("zlib"));
}

#[test]
fn test_project_dir_flag_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    create_project(temp.path());
    write(temp.path().join("nativebuilds.toml"), "");
    let sub = temp.path().join("vcpkg/ports");

    nativebuilds(&sub)
        .args(["resolve", "--no-snapshot"])
        .assert()
        .success()
        .stdout("zlib 1.3.1 [static] Zlib\n");

    let elsewhere = TempDir::new().unwrap();
    nativebuilds(elsewhere.path())
        .args(["-C", temp.path().to_str().unwrap(), "resolve", "--no-snapshot"])
        .assert()
        .success();
}
