//! CLI entry-point for counting event pairs.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument, warn};

use crate::{
    cli::ExtractArgs,
    config::Settings,
    data::counts::CountValue,
    error::Error,
    nlp::EventPipeline,
    signals::{
        self,
        pairs::{CounterOptions, PruneSchedule, ScoringMode},
        CountJob,
    },
};

/// Args for the `count` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Corpus file or directory of `.jsonl` partitions (default: DATA_DIR/corpus).
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// IDF cache produced by `idf` (default: DATA_DIR/idf.tsv).
    #[arg(long)]
    pub idf: Option<PathBuf>,
    /// Count file to write (default: OUTPUTS_DIR/pairs.counts).
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Counting policy.
    #[arg(long, default_value = "exact-coref", value_enum)]
    pub mode: ScoringMode,
    /// Events after the next one still considered as partners; 0 pairs
    /// adjacent events only (default: WINDOW).
    #[arg(long)]
    pub window: Option<usize>,
    /// Also count argument-chained event triples.
    #[arg(long)]
    pub trigrams: bool,
    /// Write the (doc, source, target) provenance of every counted pair.
    #[arg(long)]
    pub links: bool,
    /// Reuse finished partition checkpoints.
    #[arg(long)]
    pub resume: bool,
    /// Disable scheduled pruning.
    #[arg(long)]
    pub no_prune: bool,
    #[command(flatten)]
    pub extract: ExtractArgs,
}

impl Args {
    /// Reject flag combinations before any corpus file is touched.
    pub fn validate(&self) -> Result<(), Error> {
        if self.trigrams && self.mode != ScoringMode::ExactCoref {
            return Err(Error::configuration("--trigrams requires --mode exact-coref"));
        }
        if self.extract.expand_relations && self.mode == ScoringMode::DistanceDecay {
            return Err(Error::configuration(
                "--expand-relations cannot be combined with --mode distance-decay",
            ));
        }
        Ok(())
    }

    fn job<V: CountValue>(&self, settings: &Settings) -> CountJob<V> {
        let prune = (!self.no_prune && settings.prune_every > 0).then(|| PruneSchedule {
            every: settings.prune_every,
            cutoff: V::from_weight(settings.prune_cutoff),
        });
        CountJob {
            corpus: self
                .corpus
                .clone()
                .unwrap_or_else(|| settings.join_data("corpus")),
            idf: self
                .idf
                .clone()
                .unwrap_or_else(|| settings.join_data("idf.tsv")),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| settings.join_output("pairs.counts")),
            options: CounterOptions {
                mode: self.mode,
                window: self.window.unwrap_or(settings.window),
                trigrams: self.trigrams,
                links: self.links,
                gate: settings.gate(),
                prune,
            },
            resume: self.resume,
        }
    }
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    args.validate()?;
    let pipeline = EventPipeline::from_settings(&settings, args.extract.options(&settings))?;
    let counting = async {
        match args.mode {
            ScoringMode::DistanceDecay => {
                signals::count_pairs::<f64>(&settings, pipeline, args.job(&settings))
                    .await
                    .map(|counts| (counts.pairs.len(), counts.pairs.num_docs()))
            }
            ScoringMode::ExactCoref | ScoringMode::CountAll => {
                signals::count_pairs::<u64>(&settings, pipeline, args.job(&settings))
                    .await
                    .map(|counts| (counts.pairs.len(), counts.pairs.num_docs()))
            }
        }
    };
    tokio::select! {
        result = counting => {
            let (pairs, docs) = result?;
            info!(pairs, docs, mode = ?args.mode, "pair counting complete");
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; finished partitions can be reused with --resume");
            bail!("counting interrupted")
        }
    }
}
