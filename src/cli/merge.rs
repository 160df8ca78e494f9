//! CLI entry-point for merging count files.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, signals};

/// Args for the `merge` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Count files to merge.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Merged count file (default: OUTPUTS_DIR/merged.counts).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| settings.join_output("merged.counts"));
    if args.inputs.contains(&output) {
        bail!("refusing to overwrite input {}", output.display());
    }
    let merged = signals::merge_files(&args.inputs, &output)?;
    info!(inputs = args.inputs.len(), pairs = merged.len(), docs = merged.num_docs(), "merged count files");
    Ok(())
}
