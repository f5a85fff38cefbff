//! Packaging pipeline over a resolved registry
//!
//! `assemble` installs every target/linkage and normalizes the result,
//! `generate` turns the normalized trees of one package into wrapper
//! projects (descriptors, staged shared libraries and metadata). Packages
//! whose version is already in the registry are skipped by both.

use crate::descriptor::{library_names, BuildScriptGenerator, LibraryDescriptor, Variant};
use crate::error::BuildResult;
use crate::install::Installer;
use crate::layout::{Layout, Linkage};
use crate::normalize::{ArtifactNormalizer, NormalizeJob, NormalizeReport};
use crate::staging::SharedLibStager;
use nativebuilds_package::{
    BuildPackage, BuildRegistry, BuildTarget, PublicationChecker, RegistryClient,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// Linkages built for a target
pub fn linkages(target: BuildTarget) -> Vec<Linkage> {
    if target.has_dynamic_lib() {
        Linkage::ALL.to_vec()
    } else {
        vec![Linkage::Static]
    }
}

pub struct Pipeline<'a> {
    layout: &'a Layout,
    normalizer: ArtifactNormalizer,
    generator: BuildScriptGenerator,
}

impl<'a> Pipeline<'a> {
    pub fn new(layout: &'a Layout, include_debug: bool) -> Self {
        Self {
            layout,
            normalizer: ArtifactNormalizer::new(include_debug),
            generator: BuildScriptGenerator::default(),
        }
    }

    pub fn with_generator(mut self, generator: BuildScriptGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Normalization jobs of `packages` for one target and linkage
    pub fn jobs<'p>(
        &self,
        packages: impl IntoIterator<Item = &'p BuildPackage>,
        target: BuildTarget,
        linkage: Linkage,
    ) -> Vec<NormalizeJob> {
        packages
            .into_iter()
            .filter_map(|pkg| NormalizeJob::for_layout(self.layout, linkage, target, &pkg.name))
            .collect()
    }

    /// Install and normalize `packages` for every target and linkage.
    ///
    /// A target whose per-target artifacts are all published is not
    /// installed at all. Otherwise only the unpublished packages are
    /// normalized.
    pub fn assemble<C: RegistryClient>(
        &self,
        installer: &dyn Installer,
        checker: &mut PublicationChecker<C>,
        packages: &[&BuildPackage],
        targets: &[BuildTarget],
    ) -> BuildResult<Vec<NormalizeReport>> {
        let overlay_dir = self.layout.overlay_triplets_dir();
        let mut reports = Vec::new();
        for &target in targets {
            if checker.all_published(packages.iter().copied(), Some(target))? {
                info!(target = %target, "all packages published, skipping target");
                continue;
            }
            let mut pending = Vec::new();
            for &pkg in packages {
                if checker.is_published(pkg, Some(target))? {
                    debug!(package = %pkg.name, target = %target, "already published");
                } else {
                    pending.push(pkg);
                }
            }

            for linkage in linkages(target) {
                let Some(triplet) = linkage.triplet(target) else {
                    continue;
                };
                installer.install(
                    &triplet,
                    &overlay_dir,
                    &self.layout.packages_root(linkage, target),
                )?;
                let jobs = self.jobs(pending.iter().copied(), target, linkage);
                reports.extend(self.normalizer.normalize_all(&jobs)?);
            }
        }
        Ok(reports)
    }

    /// Normalize already-installed output of `packages`
    pub fn normalize(
        &self,
        packages: &[&BuildPackage],
        targets: &[BuildTarget],
    ) -> BuildResult<Vec<NormalizeReport>> {
        let jobs: Vec<NormalizeJob> = targets
            .iter()
            .flat_map(|&target| {
                linkages(target)
                    .into_iter()
                    .flat_map(move |linkage| self.jobs(packages.iter().copied(), target, linkage))
            })
            .collect();
        self.normalizer.normalize_all(&jobs)
    }

    /// Generate the wrapper projects of one package.
    ///
    /// `sublibs` maps a library to the other libraries of the package it
    /// depends on. Library names are processed longest first so that a
    /// shorter name never claims a longer library's shared files.
    pub fn generate(
        &self,
        pkg: &BuildPackage,
        sublibs: &BTreeMap<String, Vec<String>>,
    ) -> BuildResult<GenerateReport> {
        let targets: Vec<BuildTarget> = self
            .layout
            .packaged_targets(Linkage::Static, &pkg.name)
            .into_iter()
            .filter(BuildTarget::is_native)
            .collect();
        let Some(first) = targets.first() else {
            info!(package = %pkg.name, "no packaged targets, skipping");
            return Ok(GenerateReport::default());
        };

        let names = library_names(
            &self
                .layout
                .target_dir(Linkage::Static, &pkg.name, *first)
                .join("lib"),
        )?;

        let stager = SharedLibStager::new(self.layout);
        let mut claimed: BTreeSet<PathBuf> = BTreeSet::new();
        let mut report = GenerateReport::default();

        for lib in &names {
            let deps = sublibs.get(lib).cloned().unwrap_or_default();
            let mut variants = vec![Variant::RELEASE];
            if self.normalizer.include_debug() {
                variants.push(Variant::DEBUG);
            }

            for variant in variants {
                let desc = LibraryDescriptor::from_layout(
                    self.layout,
                    &pkg.name,
                    lib,
                    &pkg.version,
                    pkg.license,
                    &targets,
                    variant,
                    deps.clone(),
                )?;
                let dir = self.layout.wrapper_project_dir(&pkg.name, lib, variant.debug);
                if self.generator.write(&desc, &dir)? {
                    report.descriptors_written += 1;
                }
            }

            let project_dir = self.layout.wrapper_project_dir(&pkg.name, lib, false);
            let staged = stager.stage(&pkg.name, lib, &targets, &project_dir, &claimed)?;
            report.staged_written += staged.written;
            claimed.extend(staged.claimed);
            report.libraries.push(lib.clone());
        }

        info!(
            package = %pkg.name,
            libraries = report.libraries.len(),
            descriptors = report.descriptors_written,
            "generated wrapper projects"
        );
        Ok(report)
    }

    /// Generate every unpublished package of the registry
    pub fn generate_all<C: RegistryClient>(
        &self,
        registry: &BuildRegistry,
        sublibs: &BTreeMap<String, BTreeMap<String, Vec<String>>>,
        checker: &mut PublicationChecker<C>,
    ) -> BuildResult<BTreeMap<String, GenerateReport>> {
        let empty = BTreeMap::new();
        let mut reports = BTreeMap::new();
        for pkg in registry.iter() {
            if checker.is_published(pkg, None)? {
                info!(package = %pkg.name, version = %pkg.version, "already published, skipping");
                continue;
            }
            let report = self.generate(pkg, sublibs.get(&pkg.name).unwrap_or(&empty))?;
            reports.insert(pkg.name.clone(), report);
        }
        Ok(reports)
    }
}

/// What `generate` produced for one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Library names, in processing order
    pub libraries: Vec<String>,
    pub descriptors_written: usize,
    pub staged_written: usize,
}
