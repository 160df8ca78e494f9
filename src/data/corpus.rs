//! Corpus ingestion: JSON-lines documents carrying per-sentence parses,
//! typed dependencies and coreference mentions.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    nlp::{binder::EntityMention, events::EntityId},
};

/// One document as stored on disk, before any decoding of its sentences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    /// Bracketed constituency tree per sentence.
    pub parses: Vec<String>,
    /// Typed-dependency lines per sentence.
    pub deps: Vec<Vec<String>>,
    #[serde(default)]
    pub entities: Vec<EntityMention>,
    /// Entity ids the coreference system decided to merge.
    #[serde(default)]
    pub merges: Vec<(EntityId, EntityId)>,
}

impl RawDocument {
    /// Parses and dependencies must describe the same sentences.
    pub fn check_shape(&self) -> Result<()> {
        if self.parses.len() != self.deps.len() {
            return Err(Error::malformed(
                format!("document {}", self.id),
                format!(
                    "{} parse trees but {} dependency blocks",
                    self.parses.len(),
                    self.deps.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Partition files (`*.jsonl`) under a file or directory, in path order.
pub fn partitions(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.exists() {
        return Err(Error::configuration(format!(
            "corpus path {} does not exist",
            root.display()
        )));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(err.into()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("jsonl")
        {
            files.push(entry.into_path());
        }
    }
    info!(root = %root.display(), partitions = files.len(), "discovered corpus partitions");
    Ok(files)
}

/// Streaming reader over one partition. Lines that are not valid documents
/// are logged and skipped.
pub struct DocumentReader {
    path: PathBuf,
    lines: std::io::Lines<BufReader<File>>,
    line_no: usize,
}

impl DocumentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for DocumentReader {
    type Item = Result<RawDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawDocument>(&line) {
                Ok(doc) => return Some(Ok(doc)),
                Err(err) => {
                    warn!(path = %self.path.display(), line = self.line_no, %err, "skipping undecodable document");
                }
            }
        }
    }
}
