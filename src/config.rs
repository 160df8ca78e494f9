//! Runtime configuration utilities for event-assoc.

use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;

use crate::data::idf::Informativeness;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root folder for corpus partitions and caches.
    pub data_dir: PathBuf,
    /// Root folder for count and score outputs.
    pub outputs_dir: PathBuf,
    /// Lemmatise event tokens instead of lowercasing surface forms.
    pub use_lemmas: bool,
    /// Keep the preposition in `p_<type>` roles.
    pub full_prep: bool,
    /// Tokens need a document frequency above this to be counted.
    pub doc_cutoff: u64,
    /// Tokens need an IDF above this to be counted.
    pub idf_cutoff: f64,
    /// Events after the source considered as pair partners.
    pub window: usize,
    /// Documents between scheduled prunes; 0 disables pruning.
    pub prune_every: u64,
    /// Pairs at or below this aggregate are pruned.
    pub prune_cutoff: f64,
    /// PMI is only computed for pairs counted more often than this.
    pub min_pair_count: f64,
    /// Corpus partitions processed concurrently.
    pub workers: usize,
    /// Optional `surface<TAB>lemma` table.
    pub lemma_table: Option<PathBuf>,
    /// Optional list of event-denoting noun lemmas.
    pub noun_events: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            outputs_dir: PathBuf::from("./outputs"),
            use_lemmas: true,
            full_prep: false,
            doc_cutoff: Informativeness::DEFAULT_DOC_CUTOFF,
            idf_cutoff: Informativeness::LEMMA_IDF_CUTOFF,
            window: usize::MAX,
            prune_every: 1000,
            prune_cutoff: 1.0,
            min_pair_count: 1.0,
            workers: 2,
            lemma_table: None,
            noun_events: None,
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let use_lemmas = env_or("USE_LEMMAS", defaults.use_lemmas);
        let idf_cutoff = env::var("IDF_CUTOFF")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| Informativeness::for_lemmas(use_lemmas).idf_cutoff());
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.outputs_dir);

        std::fs::create_dir_all(&data_dir).context("creating data dir")?;
        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            data_dir,
            outputs_dir,
            use_lemmas,
            full_prep: env_or("FULL_PREP", defaults.full_prep),
            doc_cutoff: env_or("DOC_CUTOFF", defaults.doc_cutoff),
            idf_cutoff,
            window: env_or("WINDOW", defaults.window),
            prune_every: env_or("PRUNE_EVERY", defaults.prune_every),
            prune_cutoff: env_or("PRUNE_CUTOFF", defaults.prune_cutoff),
            min_pair_count: env_or("MIN_PAIR_COUNT", defaults.min_pair_count),
            workers: env_or("WORKERS", defaults.workers).max(1),
            lemma_table: env::var("LEMMA_TABLE").ok().map(PathBuf::from),
            noun_events: env::var("NOUN_EVENTS").ok().map(PathBuf::from),
        })
    }

    /// Informativeness gate built from the configured cutoffs.
    pub fn gate(&self) -> Informativeness {
        Informativeness::new(self.doc_cutoff, self.idf_cutoff)
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_gate_on_lemma_cutoffs() {
        let settings = Settings::default();
        assert_eq!(settings.gate(), Informativeness::for_lemmas(true));
        assert_eq!(settings.window, usize::MAX);
        assert_eq!(
            settings.join_output("pairs.counts"),
            PathBuf::from("./outputs/pairs.counts")
        );
    }
}
