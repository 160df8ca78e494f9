//! CLI entry-point for listing a token's strongest associates.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{config::Settings, data::counts::CountStore, signals::pmi};

/// Args for the `neighbors` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Canonical event token, e.g. `v-arrest`.
    #[arg(long)]
    pub token: String,
    /// Score file (default: OUTPUTS_DIR/pairs.pmi).
    #[arg(long)]
    pub scores: Option<PathBuf>,
    /// Number of associates to print.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let path = args
        .scores
        .unwrap_or_else(|| settings.join_output("pairs.pmi"));
    let scores = CountStore::<f64>::load(&path)?;
    for (other, score) in pmi::top_associates(&scores, &args.token, args.top) {
        println!("{other}\t{score:.4}");
    }
    Ok(())
}
