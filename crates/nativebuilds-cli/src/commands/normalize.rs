//! Normalize command - canonicalize already-installed build output

use super::{ordered_packages, Session};
use anyhow::{Context, Result};
use nativebuilds_build::{NormalizeReport, Pipeline};

/// Run the normalize command
pub fn run(session: &Session) -> Result<()> {
    let registry = session.registry()?;
    let packages = ordered_packages(&registry)?;
    let reports = Pipeline::new(&session.layout, session.config.include_debug_builds)
        .normalize(&packages, &session.targets())
        .context("Failed to normalize build output")?;

    summarize(&reports);
    Ok(())
}

/// Print totals over all normalization jobs
pub fn summarize(reports: &[NormalizeReport]) {
    let total = reports.iter().fold(NormalizeReport::default(), |mut acc, r| {
        acc.collapsed_links += r.collapsed_links;
        acc.written += r.written;
        acc.unchanged += r.unchanged;
        acc.removed += r.removed;
        acc
    });
    println!(
        "Normalized {} tree(s): {} written, {} unchanged, {} removed, {} link(s) collapsed",
        reports.len(),
        total.written,
        total.unchanged,
        total.removed,
        total.collapsed_links
    );
}
