//! Generate command - wrapper build scripts, shared-library staging, metadata

use super::Session;
use anyhow::{Context, Result};
use nativebuilds_build::Pipeline;

/// Run the generate command
///
/// Wrapper projects are only generated in publishing mode, and only for
/// packages whose version is not yet in the registry.
pub fn run(session: &Session) -> Result<()> {
    if !session.config.publishing {
        println!("Not publishing, skipping wrapper generation");
        return Ok(());
    }

    let registry = session.registry()?;
    let mut checker = session.publication_checker()?;
    let reports = Pipeline::new(&session.layout, session.config.include_debug_builds)
        .generate_all(&registry, &session.config.sublibs, &mut checker)
        .context("Failed to generate wrapper projects")?;

    for (package, report) in &reports {
        if report.libraries.is_empty() {
            println!("{}: nothing packaged", package);
            continue;
        }
        println!(
            "{}: {} ({} script(s), {} staged file(s) updated)",
            package,
            report.libraries.join(", "),
            report.descriptors_written,
            report.staged_written
        );
    }
    Ok(())
}
