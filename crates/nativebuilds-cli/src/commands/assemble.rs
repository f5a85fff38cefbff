//! Assemble command - install every target with vcpkg, then normalize

use super::{normalize::summarize, ordered_packages, triplets, Session};
use anyhow::{Context, Result};
use nativebuilds_build::Pipeline;
use std::path::Path;

/// Run the assemble command
pub fn run(session: &Session, vcpkg: Option<&Path>) -> Result<()> {
    let registry = session.registry()?;
    let packages = ordered_packages(&registry)?;
    let targets = session.targets();

    triplets::write(session, vcpkg)?;
    let installer = session.installer(vcpkg);
    let mut checker = session.publication_checker()?;
    let reports = Pipeline::new(&session.layout, session.config.include_debug_builds)
        .assemble(&installer, &mut checker, &packages, &targets)
        .context("Failed to assemble native builds")?;

    summarize(&reports);
    Ok(())
}
