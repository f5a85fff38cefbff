//! Check-published command - which artifacts the Maven registry already has

use super::{ordered_packages, Session};
use anyhow::Result;

/// Run the check-published command
///
/// Checks the package artifact and its per-target artifacts of this shard.
/// Returns whether everything is published.
pub fn run(session: &Session) -> Result<bool> {
    let registry = session.registry()?;
    let targets = session.targets();
    let mut checker = session.publication_checker()?;

    let mut all = true;
    for pkg in ordered_packages(&registry)? {
        let artifacts = std::iter::once(None).chain(targets.iter().copied().map(Some));
        for target in artifacts {
            let published = checker.is_published(pkg, target)?;
            all &= published;
            println!(
                "{} {} {}",
                pkg.artifact_name(target),
                pkg.version,
                if published { "published" } else { "missing" }
            );
        }
    }
    Ok(all)
}
