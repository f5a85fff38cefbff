//! Resolve command - select packages and features, write the snapshot

use super::{ordered_packages, Session};
use anyhow::{Context, Result};
use nativebuilds_package::ResolutionSnapshot;
use tracing::info;

/// Resolve command arguments
#[derive(Debug, Default)]
pub struct ResolveArgs {
    /// Print the snapshot as JSON instead of a table
    pub json: bool,
    /// Skip writing the snapshot file
    pub no_snapshot: bool,
}

/// Run the resolve command
pub fn run(session: &Session, args: ResolveArgs) -> Result<()> {
    let registry = session.registry()?;
    let snapshot = ResolutionSnapshot::from_registry(&registry);

    // The publishing run only reads the shards' snapshots
    if !args.no_snapshot && !session.config.publishing {
        let path = session.layout.wrappers_dir.join(ResolutionSnapshot::file_name(
            session.host.name(),
            session.config.split_id,
        ));
        let changed = snapshot
            .write(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), changed, "wrote resolution snapshot");
    }

    if session.config.publishing {
        let snapshots = ResolutionSnapshot::read_all(&session.layout.wrappers_dir)?;
        let versions = ResolutionSnapshot::check_consistent(&snapshots)
            .context("Build shards resolved different versions")?;
        info!(
            snapshots = snapshots.len(),
            packages = versions.len(),
            "snapshots are consistent"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    for pkg in ordered_packages(&registry)? {
        let features: Vec<&str> = pkg.features.iter().map(String::as_str).collect();
        println!(
            "{} {} [{}] {}",
            pkg.name,
            pkg.version,
            features.join(","),
            pkg.license
        );
    }
    Ok(())
}
