//! Targets command - print this run's shard of build targets

use super::Session;
use anyhow::Result;

/// Run the targets command
pub fn run(session: &Session, json: bool) -> Result<()> {
    let targets = session.targets();
    if json {
        println!("{}", serde_json::to_string(&targets)?);
        return Ok(());
    }
    for target in targets {
        println!("{}\t{}", target, target.triplet());
    }
    Ok(())
}
