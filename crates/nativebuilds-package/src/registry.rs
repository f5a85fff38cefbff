//! Resolved build packages

use crate::license::License;
use crate::manifest::Manifest;
use crate::target::BuildTarget;
use crate::{PackageError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// A package selected for building, with its final feature set
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPackage {
    pub name: String,
    pub version: String,
    pub features: BTreeSet<String>,
    pub license: License,
    pub manifest: Arc<Manifest>,
}

impl BuildPackage {
    /// Artifact id in the registry, optionally per target
    pub fn artifact_name(&self, target: Option<BuildTarget>) -> String {
        match target {
            Some(target) => format!("{}-{}", self.name, target.name()),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for BuildPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features: Vec<&str> = self.features.iter().map(String::as_str).collect();
        write!(
            f,
            "BuildPackage(name={}, version={}, features=[{}])",
            self.name,
            self.version,
            features.join(", ")
        )
    }
}

/// Result of a resolution run: one package per name, plus graph edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRegistry {
    packages: BTreeMap<String, BuildPackage>,
    edges: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl BuildRegistry {
    pub(crate) fn new(
        packages: BTreeMap<String, BuildPackage>,
        edges: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self { packages, edges }
    }

    pub fn get(&self, name: &str) -> Option<&BuildPackage> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Packages sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &BuildPackage> {
        self.packages.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Direct runtime dependencies of a package
    pub fn dependencies_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(name)
    }

    /// Append republish suffixes: `table[package][version] = suffix`
    pub fn apply_version_suffixes(&mut self, table: &BTreeMap<String, BTreeMap<String, String>>) {
        for pkg in self.packages.values_mut() {
            if let Some(suffix) = table.get(&pkg.name).and_then(|v| v.get(&pkg.version)) {
                pkg.version.push_str(suffix);
            }
        }
    }

    /// Dependency-first order, rejecting cycles
    pub fn build_order(&self) -> Result<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut order = Vec::with_capacity(self.packages.len());

        for name in self.packages.keys() {
            self.visit(name, &mut marks, &mut stack, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<&str> = stack[start..].to_vec();
                cycle.push(name);
                return Err(PackageError::CircularDependency(cycle.join(" -> ")));
            }
            None => {}
        }

        marks.insert(name, Mark::InProgress);
        stack.push(name);
        if let Some(deps) = self.edges.get(name) {
            for dep in deps {
                if self.packages.contains_key(dep) {
                    self.visit(dep, marks, stack, order)?;
                }
            }
        }
        stack.pop();
        marks.insert(name, Mark::Done);
        order.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn package(name: &str, features: &[&str]) -> BuildPackage {
        BuildPackage {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            features: features.iter().map(|s| s.to_string()).collect(),
            license: License::Mit,
            manifest: Arc::new(
                Manifest::from_str(&format!(r#"{{ "name": "{}", "version": "1.0.0" }}"#, name))
                    .unwrap(),
            ),
        }
    }

    fn registry(edges: &[(&str, &[&str])]) -> BuildRegistry {
        let packages = edges
            .iter()
            .map(|(name, _)| (name.to_string(), package(name, &[])))
            .collect();
        let edges = edges
            .iter()
            .map(|(name, deps)| {
                (
                    name.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect();
        BuildRegistry::new(packages, edges)
    }

    #[test]
    fn test_build_order_dependency_first() {
        let registry = registry(&[
            ("curl", &["openssl", "zlib"]),
            ("openssl", &[]),
            ("zlib", &[]),
            ("nghttp2", &["openssl"]),
        ]);
        assert_eq!(
            registry.build_order().unwrap(),
            vec!["openssl", "zlib", "curl", "nghttp2"]
        );
    }

    #[test]
    fn test_build_order_detects_cycle() {
        let registry = registry(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = registry.build_order().unwrap_err();
        assert!(matches!(err, PackageError::CircularDependency(ref path) if path == "a -> b -> c -> a"));
    }

    #[test]
    fn test_version_suffixes() {
        let mut registry = registry(&[("zlib", &[]), ("lz4", &[])]);
        let mut table = BTreeMap::new();
        table.insert(
            "zlib".to_string(),
            BTreeMap::from([("1.0.0".to_string(), ".4".to_string())]),
        );
        table.insert(
            "lz4".to_string(),
            BTreeMap::from([("0.9.0".to_string(), ".2".to_string())]),
        );

        registry.apply_version_suffixes(&table);
        assert_eq!(registry.get("zlib").unwrap().version, "1.0.0.4");
        assert_eq!(registry.get("lz4").unwrap().version, "1.0.0");
    }

    #[test]
    fn test_display_and_artifact_names() {
        let pkg = package("curl", &["ssl", "http2"]);
        assert_eq!(
            pkg.to_string(),
            "BuildPackage(name=curl, version=1.0.0, features=[http2, ssl])"
        );
        assert_eq!(
            pkg.artifact_name(Some(BuildTarget::IosArm64)),
            "curl-iosArm64"
        );
        assert_eq!(pkg.artifact_name(None), "curl");
    }
}
