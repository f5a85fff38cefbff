//! Feature closure within a single package

use crate::manifest::Manifest;
use crate::platform::Platform;
use crate::{PackageError, Result};
use std::collections::{BTreeSet, VecDeque};

/// Expands requested features through the package's self-references.
///
/// A feature's dependency entry that names the package itself (`"zstd"`
/// inside zstd's own `tools` feature) means "enabling this feature also
/// enables those features". Nothing else is followed here; cross-package
/// edges belong to the graph resolver.
#[derive(Debug, Clone, Copy)]
pub struct FeatureResolver<'a> {
    platform: &'a Platform,
}

impl<'a> FeatureResolver<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Compute the closure of `requested` over `manifest`'s feature table.
    ///
    /// Every requested and transitively required feature must exist in the
    /// table; an unknown name is an error.
    pub fn resolve<I, S>(&self, manifest: &Manifest, requested: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue: VecDeque<String> = requested.into_iter().map(Into::into).collect();
        let mut result = BTreeSet::new();

        while let Some(feature) = queue.pop_front() {
            if result.contains(&feature) {
                continue;
            }
            let def = manifest
                .feature(&feature)
                .ok_or_else(|| PackageError::unknown_feature(&manifest.name, &feature))?;
            result.insert(feature);

            for dep in def.dependencies.iter().filter(|d| d.name == manifest.name) {
                if !self.platform.matches(dep.platform.as_deref())? {
                    continue;
                }
                for sub in &dep.features {
                    if self.platform.matches(sub.platform.as_deref())?
                        && !result.contains(&sub.name)
                    {
                        queue.push_back(sub.name.clone());
                    }
                }
            }
        }

        Ok(result)
    }
}
