//! CLI entry-point for PMI scoring.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, signals, signals::pmi::AssociationScorer};

/// Args for the `score` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Count file (default: OUTPUTS_DIR/pairs.counts).
    #[arg(long)]
    pub counts: Option<PathBuf>,
    /// IDF cache (default: DATA_DIR/idf.tsv).
    #[arg(long)]
    pub idf: Option<PathBuf>,
    /// Score file to write (default: OUTPUTS_DIR/pairs.pmi).
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Pairs need a count above this (default: MIN_PAIR_COUNT).
    #[arg(long)]
    pub min_pair_count: Option<f64>,
    /// Tokens need a document frequency above this (default: DOC_CUTOFF).
    #[arg(long)]
    pub doc_cutoff: Option<u64>,
    /// Skip the sparse-data discount.
    #[arg(long)]
    pub no_discount: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let counts = args
        .counts
        .unwrap_or_else(|| settings.join_output("pairs.counts"));
    let idf = args.idf.unwrap_or_else(|| settings.join_data("idf.tsv"));
    let output = args
        .output
        .unwrap_or_else(|| settings.join_output("pairs.pmi"));
    let scorer = AssociationScorer {
        min_pair_count: args.min_pair_count.unwrap_or(settings.min_pair_count),
        doc_cutoff: args.doc_cutoff.unwrap_or(settings.doc_cutoff),
        discount: !args.no_discount,
    };
    let scores = signals::score(&counts, &idf, &output, scorer)?;
    info!(path = %output.display(), pairs = scores.len(), "wrote association scores");
    Ok(())
}
