#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Lantern level headlessly and reports
//! how the enemies behaved.

mod level;
mod sim;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::sim::Session;

/// Runs a Lantern level without rendering.
#[derive(Debug, Parser)]
#[command(name = "lantern", version, about, long_about = None)]
struct Cli {
    /// Level file to load instead of the built-in demo level.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Overrides the seed that staggers enemy decisions.
    #[arg(long)]
    seed: Option<u64>,
    /// Logs enemy decisions at debug level.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Lantern command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut file = level::load(cli.level.as_deref())?;
    if let Some(seed) = cli.seed {
        file.hunting.seed = seed;
    }

    let mut session = Session::new(file).context("failed to build level")?;
    let report = session.run(cli.ticks);
    print!("{report}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
