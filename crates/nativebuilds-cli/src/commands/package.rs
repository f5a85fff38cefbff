//! Package command - per-target archives of the normalized static trees

use super::{ordered_packages, Session};
use anyhow::{Context, Result};
use nativebuilds_build::archive_package;

/// Run the package command
pub fn run(session: &Session) -> Result<()> {
    let registry = session.registry()?;
    let mut count = 0;
    for pkg in ordered_packages(&registry)? {
        let archives = archive_package(&session.layout, &pkg.name)
            .with_context(|| format!("Failed to archive {}", pkg.name))?;
        count += archives.len();
    }
    println!(
        "{} archive(s) in {}",
        count,
        session.layout.artifacts_dir().display()
    );
    Ok(())
}
