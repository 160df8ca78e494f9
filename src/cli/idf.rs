//! CLI entry-point for building the IDF cache.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{cli::ExtractArgs, config::Settings, nlp::EventPipeline, signals};

/// Args for the `idf` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Corpus file or directory of `.jsonl` partitions (default: DATA_DIR/corpus).
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// IDF cache to write (default: DATA_DIR/idf.tsv).
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub extract: ExtractArgs,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let corpus = args.corpus.unwrap_or_else(|| settings.join_data("corpus"));
    let output = args.output.unwrap_or_else(|| settings.join_data("idf.tsv"));
    let pipeline = EventPipeline::from_settings(&settings, args.extract.options(&settings))?;
    let idf = signals::build_idf(&settings, pipeline, &corpus, &output).await?;
    info!(docs = idf.num_docs(), tokens = idf.len(), "IDF cache ready");
    Ok(())
}
