//! "Is this version already published?" lookups against a Maven registry

use crate::registry::BuildPackage;
use crate::target::BuildTarget;
use crate::{PackageError, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Maven repository
pub const DEFAULT_REGISTRY_URL: &str = "https://repo1.maven.org/maven2";

/// Transport used for registry lookups
pub trait RegistryClient {
    /// HTTP status of a GET request to `url`
    fn status(&self, url: &str) -> Result<u16>;
}

/// Blocking HTTP client
pub struct HttpRegistryClient {
    client: reqwest::blocking::Client,
}

impl HttpRegistryClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PackageError::RegistryLookup {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl RegistryClient for HttpRegistryClient {
    fn status(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| PackageError::RegistryLookup {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(response.status().as_u16())
    }
}

/// Caches publication lookups for one run.
///
/// 200 means published and 404/410 means not published. Anything else is a
/// [`PackageError::RegistryLookup`] unless the checker is lenient, in which
/// case it counts as not published.
pub struct PublicationChecker<C> {
    client: C,
    registry_url: String,
    group_path: String,
    lenient: bool,
    cache: HashMap<String, bool>,
}

impl<C: RegistryClient> PublicationChecker<C> {
    pub fn new(client: C, registry_url: &str, group_id: &str) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            group_path: group_id.replace('.', "/"),
            lenient: false,
            cache: HashMap::new(),
        }
    }

    /// Treat every non-200 answer as "not published"
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// URL of the POM of `artifact` in `version`
    pub fn pom_url(&self, artifact: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}-{}.pom",
            self.registry_url, self.group_path, artifact, version, artifact, version
        )
    }

    /// Whether the package (or its per-target artifact) is published
    pub fn is_published(&mut self, pkg: &BuildPackage, target: Option<BuildTarget>) -> Result<bool> {
        let url = self.pom_url(&pkg.artifact_name(target), &pkg.version);
        if let Some(&published) = self.cache.get(&url) {
            return Ok(published);
        }

        let published = match self.client.status(&url) {
            Ok(200) => true,
            Ok(404) | Ok(410) => false,
            Ok(status) if self.lenient => {
                warn!(%url, status, "unexpected registry status, assuming unpublished");
                false
            }
            Ok(status) => {
                return Err(PackageError::RegistryLookup {
                    url,
                    reason: format!("unexpected HTTP status {}", status),
                })
            }
            Err(e) if self.lenient => {
                warn!(%url, error = %e, "registry lookup failed, assuming unpublished");
                false
            }
            Err(e) => return Err(e),
        };

        debug!(%url, published, "publication check");
        self.cache.insert(url, published);
        Ok(published)
    }

    /// Whether every package is published
    pub fn all_published<'a>(
        &mut self,
        packages: impl IntoIterator<Item = &'a BuildPackage>,
        target: Option<BuildTarget>,
    ) -> Result<bool> {
        for pkg in packages {
            if !self.is_published(pkg, target)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of distinct lookups performed
    pub fn lookups(&self) -> usize {
        self.cache.len()
    }
}
