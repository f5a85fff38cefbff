//! Port manifest parsing and types (vcpkg.json)

use crate::features::FeatureResolver;
use crate::platform::Platform;
use crate::PackageError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Port manifest (vcpkg.json)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub name: String,
    #[serde(
        alias = "version-semver",
        alias = "version-date",
        alias = "version-string"
    )]
    pub version: String,
    #[serde(default, rename = "port-version", skip_serializing_if = "is_zero")]
    pub port_version: u32,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureDef>,
    #[serde(default, rename = "default-features")]
    pub default_features: Vec<DefaultFeatureRef>,
    #[serde(default)]
    pub license: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Manifest {
    /// Parse manifest from a JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load manifest from file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PackageError::io(path, e))?;
        Self::from_str(&content).map_err(|source| PackageError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a feature definition
    pub fn feature(&self, name: &str) -> Option<&FeatureDef> {
        self.features.get(name)
    }

    /// Feature closure of `features` within this package, ignoring platform
    /// qualifiers.
    pub fn resolve_features<I, S>(&self, features: I) -> crate::Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureResolver::new(&Platform::Any).resolve(self, features)
    }
}

/// Reference from one manifest to another package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "DependencySpec")]
pub struct DependencyRef {
    pub name: String,
    pub host: bool,
    #[serde(rename = "default-features")]
    pub use_default_features: bool,
    pub features: Vec<DefaultFeatureRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl DependencyRef {
    /// Plain runtime dependency with default features
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: false,
            use_default_features: true,
            features: Vec::new(),
            platform: None,
        }
    }

    /// Mark as a build-time tool dependency
    pub fn host(mut self) -> Self {
        self.host = true;
        self
    }

    /// Opt out of the referenced package's default features
    pub fn without_default_features(mut self) -> Self {
        self.use_default_features = false;
        self
    }

    /// Request additional features
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features
            .extend(features.into_iter().map(DefaultFeatureRef::new));
        self
    }

    /// Restrict to a platform expression
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// Dependency as written in JSON: a bare name or an object
#[derive(Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    Name(String),
    Detailed(DetailedDependency),
}

#[derive(Deserialize)]
struct DetailedDependency {
    name: String,
    #[serde(default)]
    host: bool,
    #[serde(default = "default_true", rename = "default-features")]
    default_features: bool,
    #[serde(default)]
    features: Vec<DefaultFeatureRef>,
    #[serde(default)]
    platform: Option<String>,
}

fn default_true() -> bool {
    true
}

impl From<DependencySpec> for DependencyRef {
    fn from(spec: DependencySpec) -> Self {
        match spec {
            DependencySpec::Name(name) => DependencyRef::new(name),
            DependencySpec::Detailed(d) => DependencyRef {
                name: d.name,
                host: d.host,
                use_default_features: d.default_features,
                features: d.features,
                platform: d.platform,
            },
        }
    }
}

/// Feature name with an optional platform qualifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "FeatureSpec")]
pub struct DefaultFeatureRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl DefaultFeatureRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        platform: Option<String>,
    },
}

impl From<FeatureSpec> for DefaultFeatureRef {
    fn from(spec: FeatureSpec) -> Self {
        match spec {
            FeatureSpec::Name(name) => DefaultFeatureRef::new(name),
            FeatureSpec::Detailed { name, platform } => DefaultFeatureRef { name, platform },
        }
    }
}

/// Optional feature of a package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FeatureDef {
    #[serde(default, deserialize_with = "deserialize_description")]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports: Option<String>,
}

impl FeatureDef {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            dependencies: Vec::new(),
            supports: None,
        }
    }

    pub fn with_dependency(mut self, dependency: DependencyRef) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

// vcpkg allows the description to be split into several lines
fn deserialize_description<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Description {
        Line(String),
        Lines(Vec<String>),
    }

    Ok(match Description::deserialize(deserializer)? {
        Description::Line(line) => line,
        Description::Lines(lines) => lines.join(" "),
    })
}
