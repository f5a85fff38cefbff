//! Triplets command - write overlay triplets for the selected targets

use super::Session;
use anyhow::{Context, Result};
use nativebuilds_build::OverlayTriplets;
use std::path::Path;

/// Write the overlays and return how many files changed
pub fn write(session: &Session, vcpkg: Option<&Path>) -> Result<usize> {
    let installer = session.installer(vcpkg);
    let overlays = OverlayTriplets::new(
        installer.triplets_dir(),
        session.layout.overlay_triplets_dir(),
    );
    overlays
        .write(&session.targets())
        .context("Failed to write overlay triplets")
}

/// Run the triplets command
pub fn run(session: &Session, vcpkg: Option<&Path>) -> Result<()> {
    let changed = write(session, vcpkg)?;
    println!(
        "{} overlay triplet(s) updated in {}",
        changed,
        session.layout.overlay_triplets_dir().display()
    );
    Ok(())
}
