//! Association layer: pair counting, IDF building and PMI scoring over a corpus.
//!
//! Each corpus partition is counted by an independent worker; the per-worker
//! outputs are merged afterwards.

pub mod decay;
pub mod pairs;
pub mod pmi;

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::{
    config::Settings,
    data::{
        corpus::{self, DocumentReader},
        counts::{CountStore, CountValue},
        idf::IdfMap,
    },
    nlp::EventPipeline,
};

use self::{
    pairs::{CounterOptions, PairCounter, PairCounts},
    pmi::AssociationScorer,
};

/// Everything a counting run needs besides the pipeline.
#[derive(Debug, Clone)]
pub struct CountJob<V> {
    pub corpus: PathBuf,
    pub idf: PathBuf,
    pub output: PathBuf,
    pub options: CounterOptions<V>,
    /// Reuse finished partition files from an earlier, interrupted run.
    pub resume: bool,
}

/// Count document and term frequencies of event tokens and write the IDF cache.
pub async fn build_idf(
    settings: &Settings,
    pipeline: EventPipeline,
    corpus_path: &Path,
    output: &Path,
) -> Result<IdfMap> {
    let partitions = corpus::partitions(corpus_path)?;
    let mut idf = stream::iter(partitions)
        .map(|path| {
            let pipeline = pipeline.clone();
            tokio::task::spawn_blocking(move || idf_partition(&pipeline, &path))
        })
        .buffer_unordered(settings.workers)
        .map(|joined| joined.context("IDF worker panicked").and_then(|result| result))
        .try_fold(IdfMap::new(), |mut acc, partial| async move {
            acc.merge(&partial);
            Ok(acc)
        })
        .await?;

    idf.calculate_idf();
    idf.save(output)
        .with_context(|| format!("writing IDF cache {}", output.display()))?;
    Ok(idf)
}

fn idf_partition(pipeline: &EventPipeline, path: &Path) -> Result<IdfMap> {
    let mut idf = IdfMap::new();
    for doc in DocumentReader::open(path)? {
        let doc = doc?;
        match pipeline.process(&doc) {
            Ok(events) => idf.count_document(events.iter().map(|e| e.token.as_str())),
            Err(err) if err.is_recoverable() => {
                warn!(doc = %doc.id, %err, "skipping document");
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!(path = %path.display(), docs = idf.num_docs(), tokens = idf.len(), "counted partition frequencies");
    Ok(idf)
}

/// Count event pairs over every corpus partition and write the merged counts.
pub async fn count_pairs<V: CountValue>(
    settings: &Settings,
    pipeline: EventPipeline,
    job: CountJob<V>,
) -> Result<PairCounts<V>> {
    let idf = Arc::new(
        IdfMap::load(&job.idf)
            .with_context(|| format!("loading IDF cache {}", job.idf.display()))?,
    );
    // Surface configuration errors before any partition is opened.
    PairCounter::new(job.options, idf.clone())?;

    let partitions = corpus::partitions(&job.corpus)?;
    let checkpoints = checkpoint_dir(&job.output);
    tokio::fs::create_dir_all(&checkpoints).await?;

    let mut counts = stream::iter(partitions)
        .map(|path| {
            let pipeline = pipeline.clone();
            let idf = idf.clone();
            let options = job.options;
            let checkpoint = checkpoints.join(partition_file(&job.corpus, &path));
            let resume = job.resume;
            tokio::task::spawn_blocking(move || -> Result<PairCounts<V>> {
                if resume && checkpoint.exists() {
                    info!(path = %checkpoint.display(), "resuming from partition checkpoint");
                    return Ok(PairCounts::load(&checkpoint)?);
                }
                let counts = count_partition(&pipeline, idf, options, &path)?;
                counts.save(&checkpoint)?;
                Ok(counts)
            })
        })
        .buffer_unordered(settings.workers)
        .map(|joined| joined.context("counting worker panicked").and_then(|result| result))
        .try_fold(PairCounts::default(), |mut acc, partial| async move {
            acc.merge(partial);
            Ok(acc)
        })
        .await?;

    if let Some(schedule) = job.options.prune {
        counts.trim(schedule.cutoff);
    }
    counts
        .save(&job.output)
        .with_context(|| format!("writing counts {}", job.output.display()))?;
    info!(
        path = %job.output.display(),
        pairs = counts.pairs.len(),
        docs = counts.pairs.num_docs(),
        "wrote merged pair counts"
    );
    Ok(counts)
}

fn count_partition<V: CountValue>(
    pipeline: &EventPipeline,
    idf: Arc<IdfMap>,
    options: CounterOptions<V>,
    path: &Path,
) -> Result<PairCounts<V>> {
    let mut counter = PairCounter::new(options, idf)?;
    let mut skipped = 0usize;
    for doc in DocumentReader::open(path)? {
        let doc = doc?;
        match pipeline.process(&doc) {
            Ok(events) => {
                counter.process_document(&doc.id, &events);
            }
            Err(err) if err.is_recoverable() => {
                warn!(doc = %doc.id, %err, "skipping document");
                skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
    info!(path = %path.display(), docs = counter.documents(), skipped, "counted partition");
    Ok(counter.finish())
}

fn checkpoint_dir(output: &Path) -> PathBuf {
    output
        .parent()
        .map(|parent| parent.join("partitions"))
        .unwrap_or_else(|| PathBuf::from("partitions"))
}

/// Checkpoint name for a partition: its path below the corpus root with
/// directory separators flattened to `__`, so `1994/part.jsonl` and
/// `1995/part.jsonl` never share a file.
fn partition_file(corpus: &Path, path: &Path) -> PathBuf {
    let relative = path
        .strip_prefix(corpus)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(path.file_name().unwrap_or_default()));
    let stem = relative.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .filter_map(|part| match part {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let name = if parts.is_empty() {
        "partition".to_string()
    } else {
        parts.join("__")
    };
    PathBuf::from(format!("{name}.counts"))
}

/// Score a count file with PMI and write the scores in count-file format.
pub fn score(
    counts_path: &Path,
    idf_path: &Path,
    output: &Path,
    scorer: AssociationScorer,
) -> Result<CountStore<f64>> {
    let counts = CountStore::<f64>::load(counts_path)
        .with_context(|| format!("loading counts {}", counts_path.display()))?;
    let idf = IdfMap::load(idf_path)
        .with_context(|| format!("loading IDF cache {}", idf_path.display()))?;
    let scores = scorer.score_all(&counts, &idf);
    scores.save(output)?;
    Ok(scores)
}

/// Merge count files from independent runs.
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<CountStore<f64>> {
    let mut merged = CountStore::<f64>::new();
    for input in inputs {
        let store = CountStore::<f64>::load(input)
            .with_context(|| format!("loading counts {}", input.display()))?;
        merged.merge(&store);
    }
    merged.save(output)?;
    Ok(merged)
}

/// Prune a count file in place or into `output`.
pub fn trim_file(input: &Path, cutoff: f64, output: &Path) -> Result<usize> {
    let mut store = CountStore::<f64>::load(input)
        .with_context(|| format!("loading counts {}", input.display()))?;
    let removed = store.trim(cutoff);
    store.save(output)?;
    info!(removed, remaining = store.len(), "trimmed count file");
    Ok(removed)
}
