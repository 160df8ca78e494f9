//! Command-line interface wiring for event-assoc.

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::{
    config::Settings,
    nlp::events::{ExtractOptions, TokenFilter},
};

pub mod count;
pub mod idf;
pub mod merge;
pub mod neighbors;
pub mod score;
pub mod trim;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Event-pair association statistics for narrative chains", long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Idf(args) => idf::run(args, settings).await,
            Commands::Count(args) => count::run(args, settings).await,
            Commands::Score(args) => score::run(args, settings).await,
            Commands::Merge(args) => merge::run(args, settings).await,
            Commands::Trim(args) => trim::run(args, settings).await,
            Commands::Neighbors(args) => neighbors::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Count event token frequencies and write the IDF cache.
    Idf(idf::Args),
    /// Count co-occurring event pairs.
    Count(count::Args),
    /// Turn pair counts into PMI association scores.
    Score(score::Args),
    /// Merge count files from independent runs.
    Merge(merge::Args),
    /// Prune low counts from a count file.
    Trim(trim::Args),
    /// Show the strongest associates of one event token.
    Neighbors(neighbors::Args),
}

/// Which predicates become events.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EventFilter {
    Verbs,
    Nouns,
    VerbsAndNouns,
    /// Verbs plus event-denoting nouns.
    VerbsAndNominals,
    All,
    /// Verbs and nouns without particle compounds.
    Base,
}

impl From<EventFilter> for TokenFilter {
    fn from(filter: EventFilter) -> Self {
        match filter {
            EventFilter::Verbs => Self::Verbs,
            EventFilter::Nouns => Self::Nouns,
            EventFilter::VerbsAndNouns => Self::VerbsAndNouns,
            EventFilter::VerbsAndNominals => Self::VerbsAndNominals,
            EventFilter::All => Self::All,
            EventFilter::Base => Self::Base,
        }
    }
}

/// Extraction flags shared by `idf` and `count`.
#[derive(Debug, Clone, ClapArgs)]
pub struct ExtractArgs {
    /// Event token classes.
    #[arg(long, default_value = "verbs-and-nominals", value_enum)]
    pub filter: EventFilter,
    /// Use lowercased surface forms instead of lemmas.
    #[arg(long)]
    pub surface: bool,
    /// Keep preposition types in roles (p_with, p_in, ...).
    #[arg(long)]
    pub full_prep: bool,
    /// One event per governor edge rather than per governor.
    #[arg(long)]
    pub expand_relations: bool,
}

impl ExtractArgs {
    pub fn options(&self, settings: &Settings) -> ExtractOptions {
        ExtractOptions {
            filter: self.filter.into(),
            use_lemmas: settings.use_lemmas && !self.surface,
            expand_relations: self.expand_relations,
            full_prep: settings.full_prep || self.full_prep,
        }
    }
}
