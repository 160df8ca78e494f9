//! Per-token document/term frequencies and inverse document frequency.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::File,
    io::{BufRead, BufReader, Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Frequency statistics for one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IdfRecord {
    pub doc_frequency: u64,
    pub term_frequency: u64,
    pub idf: f64,
    pub information_content: f64,
}

/// Token frequency table. IDF scores are only meaningful after
/// [`IdfMap::calculate_idf`] has run over the final document counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfMap {
    records: HashMap<String, IdfRecord>,
    num_docs: u64,
}

impl IdfMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// One more document contains `token`. Callers dedupe within a document.
    pub fn increase_doc_frequency(&mut self, token: &str) {
        self.records.entry(token.to_string()).or_default().doc_frequency += 1;
    }

    /// One more raw occurrence of `token`.
    pub fn increase_term_frequency(&mut self, token: &str) {
        self.records.entry(token.to_string()).or_default().term_frequency += 1;
    }

    /// One more document in the corpus.
    pub fn increase_document_total(&mut self) {
        self.num_docs += 1;
    }

    /// Count all token occurrences of one document: every occurrence raises the
    /// term frequency, each distinct token raises its document frequency once.
    pub fn count_document<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        for token in tokens {
            self.increase_term_frequency(token);
            if seen.insert(token) {
                self.increase_doc_frequency(token);
            }
        }
        self.increase_document_total();
    }

    /// Set `idf = ln(numDocs / docFrequency)` and the information content
    /// `-ln(termFrequency / totalTermFrequency)` for every token.
    ///
    /// Tokens never seen in a document keep an IDF of zero.
    pub fn calculate_idf(&mut self) {
        let num_docs = self.num_docs as f64;
        let total_terms = self.total_term_frequency() as f64;
        for record in self.records.values_mut() {
            record.idf = if record.doc_frequency > 0 && num_docs > 0.0 {
                (num_docs / record.doc_frequency as f64).ln()
            } else {
                0.0
            };
            record.information_content = if record.term_frequency > 0 && total_terms > 0.0 {
                -(record.term_frequency as f64 / total_terms).ln()
            } else {
                0.0
            };
        }
    }

    /// Fold another partition's counts into this one. IDF must be recalculated.
    pub fn merge(&mut self, other: &IdfMap) {
        for (token, theirs) in &other.records {
            let ours = self.records.entry(token.clone()).or_default();
            ours.doc_frequency += theirs.doc_frequency;
            ours.term_frequency += theirs.term_frequency;
        }
        self.num_docs += other.num_docs;
    }

    pub fn record(&self, token: &str) -> Option<&IdfRecord> {
        self.records.get(token)
    }

    pub fn doc_frequency(&self, token: &str) -> u64 {
        self.records.get(token).map_or(0, |r| r.doc_frequency)
    }

    pub fn term_frequency(&self, token: &str) -> u64 {
        self.records.get(token).map_or(0, |r| r.term_frequency)
    }

    pub fn idf(&self, token: &str) -> f64 {
        self.records.get(token).map_or(0.0, |r| r.idf)
    }

    pub fn information_content(&self, token: &str) -> f64 {
        self.records.get(token).map_or(0.0, |r| r.information_content)
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn total_term_frequency(&self) -> u64 {
        self.records.values().map(|r| r.term_frequency).sum()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.records.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Write `NUMDOCS <n>` then `token, tf, df, idf, ic` rows, sorted by token.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .flexible(true)
            .from_writer(writer);
        out.write_record([format!("NUMDOCS {}", self.num_docs)])?;
        let sorted: BTreeMap<_, _> = self.records.iter().collect();
        for (token, record) in sorted {
            out.write_record([
                token.clone(),
                record.term_frequency.to_string(),
                record.doc_frequency.to_string(),
                record.idf.to_string(),
                record.information_content.to_string(),
            ])?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read the cache format; the information-content column is optional.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();
        let num_docs = match lines.next() {
            Some(line) => parse_num_docs(&line?)?,
            None => return Err(Error::parse("empty IDF file")),
        };
        let mut map = Self {
            records: HashMap::new(),
            num_docs,
        };
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 4 {
                return Err(Error::parse(format!("IDF row with {} columns: {line:?}", cols.len())));
            }
            let record = IdfRecord {
                term_frequency: parse_field(cols[1], &line)?,
                doc_frequency: parse_field(cols[2], &line)?,
                idf: parse_field(cols[3], &line)?,
                information_content: match cols.get(4) {
                    Some(ic) => parse_field(ic, &line)?,
                    None => 0.0,
                },
            };
            map.records.insert(cols[0].to_string(), record);
        }
        Ok(map)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write_to(File::create(path)?)?;
        info!(path = %path.display(), tokens = self.len(), docs = self.num_docs, "wrote IDF cache");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let map = Self::read_from(File::open(path)?)?;
        info!(path = %path.display(), tokens = map.len(), docs = map.num_docs, "loaded IDF cache");
        Ok(map)
    }
}

/// Parse a `NUMDOCS <n>` header line.
pub(crate) fn parse_num_docs(line: &str) -> Result<u64> {
    line.strip_prefix("NUMDOCS")
        .map(str::trim)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::parse(format!("expected NUMDOCS header, found {line:?}")))
}

fn parse_field<T: std::str::FromStr>(field: &str, line: &str) -> Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::parse(format!("bad number {field:?} in {line:?}")))
}

/// The informativeness gate: a token qualifies when its document frequency
/// exceeds the doc cutoff and its IDF exceeds the IDF cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Informativeness {
    doc_cutoff: u64,
    idf_cutoff: f64,
    open: bool,
}

impl Informativeness {
    pub const DEFAULT_DOC_CUTOFF: u64 = 10;
    pub const LEMMA_IDF_CUTOFF: f64 = 0.7;
    pub const SURFACE_IDF_CUTOFF: f64 = 1.5;

    pub fn new(doc_cutoff: u64, idf_cutoff: f64) -> Self {
        Self {
            doc_cutoff,
            idf_cutoff,
            open: false,
        }
    }

    /// Default cutoffs, which depend on whether tokens are lemmas.
    pub fn for_lemmas(use_lemmas: bool) -> Self {
        let idf_cutoff = if use_lemmas {
            Self::LEMMA_IDF_CUTOFF
        } else {
            Self::SURFACE_IDF_CUTOFF
        };
        Self::new(Self::DEFAULT_DOC_CUTOFF, idf_cutoff)
    }

    /// Gate that admits every token, tracked or not.
    pub fn permissive() -> Self {
        Self {
            doc_cutoff: 0,
            idf_cutoff: f64::NEG_INFINITY,
            open: true,
        }
    }

    pub fn doc_cutoff(&self) -> u64 {
        self.doc_cutoff
    }

    pub fn idf_cutoff(&self) -> f64 {
        self.idf_cutoff
    }

    pub fn admits(&self, idf: &IdfMap, token: &str) -> bool {
        self.open
            || (idf.doc_frequency(token) > self.doc_cutoff && idf.idf(token) > self.idf_cutoff)
    }
}

impl Default for Informativeness {
    fn default() -> Self {
        Self::for_lemmas(true)
    }
}
