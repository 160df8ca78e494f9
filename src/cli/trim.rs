//! CLI entry-point for pruning a count file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{config::Settings, signals};

/// Args for the `trim` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Count file to prune.
    #[arg(long)]
    pub counts: PathBuf,
    /// Drop pairs whose count is at or below this (default: PRUNE_CUTOFF).
    #[arg(long)]
    pub cutoff: Option<f64>,
    /// Where to write the result (default: overwrite the input).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let output = args.output.unwrap_or_else(|| args.counts.clone());
    signals::trim_file(
        &args.counts,
        args.cutoff.unwrap_or(settings.prune_cutoff),
        &output,
    )?;
    Ok(())
}
