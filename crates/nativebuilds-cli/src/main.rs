use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Session;

/// Package vcpkg-built native libraries as Kotlin Multiplatform artifacts.
///
/// Resolves the project's vcpkg manifest into the set of packages to build,
/// drives the builds, canonicalizes their output and generates one wrapper
/// project per library.
///
/// EXAMPLES:
///     nativebuilds resolve              Resolve packages and write the snapshot
///     nativebuilds targets              Show this shard's targets
///     nativebuilds assemble             Build and normalize every target
///     nativebuilds generate             Write wrapper projects
///     nativebuilds check-published      Query the Maven registry
///
/// ENVIRONMENT VARIABLES:
///     BUILD_TARGETS         Comma-separated target names
///     MAX_SPLITS            Number of CI shards
///     BUILD_SPLIT_ID        Index of this shard
///     INCLUDE_DEBUG_BUILDS  'true' to package debug builds
///     PUBLISHING            'true' to verify snapshots across shards
///     RUST_LOG              Log filter (default: info)
#[derive(Parser)]
#[command(name = "nativebuilds")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true, env = "NATIVEBUILDS_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve packages and features from the vcpkg manifest
    ///
    /// Writes the resolution snapshot pkg-<os>-<split>.json into the
    /// wrappers directory. In publishing mode nothing is written and all
    /// snapshots are compared instead.
    Resolve {
        /// Print the snapshot as JSON
        #[arg(long, env = "NATIVEBUILDS_JSON")]
        json: bool,
        /// Do not write the snapshot file
        #[arg(long)]
        no_snapshot: bool,
    },

    /// Print the build targets of this shard
    Targets {
        /// Print as a JSON array
        #[arg(long, env = "NATIVEBUILDS_JSON")]
        json: bool,
    },

    /// Write overlay triplets for the selected targets
    Triplets {
        /// Path to the vcpkg executable
        #[arg(long)]
        vcpkg: Option<PathBuf>,
    },

    /// Install every target with vcpkg, then normalize the output
    Assemble {
        /// Path to the vcpkg executable
        #[arg(long)]
        vcpkg: Option<PathBuf>,
    },

    /// Normalize already-installed build output
    Normalize,

    /// Generate wrapper projects, stage shared libraries and write metadata
    ///
    /// Only runs in publishing mode and skips already published packages.
    Generate,

    /// Write per-target archives of the normalized static trees
    Package,

    /// Check which artifacts are already published
    ///
    /// Exits with status 1 if anything is missing.
    CheckPublished,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let session = Session::load(cli.project_dir.as_deref())?;

    match cli.command {
        Commands::Resolve { json, no_snapshot } => {
            commands::resolve::run(&session, commands::resolve::ResolveArgs { json, no_snapshot })?;
        }
        Commands::Targets { json } => {
            commands::targets::run(&session, json)?;
        }
        Commands::Triplets { vcpkg } => {
            commands::triplets::run(&session, vcpkg.as_deref())?;
        }
        Commands::Assemble { vcpkg } => {
            commands::assemble::run(&session, vcpkg.as_deref())?;
        }
        Commands::Normalize => {
            commands::normalize::run(&session)?;
        }
        Commands::Generate => {
            commands::generate::run(&session)?;
        }
        Commands::Package => {
            commands::package::run(&session)?;
        }
        Commands::CheckPublished => {
            if !commands::check_published::run(&session)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
