//! Sparse symmetric pair counts.
//!
//! Each unordered pair is stored once, under its lexicographically smaller
//! token, so every access alphabetises its operands first. The on-disk form is
//! a `NUMDOCS <n>` header followed by one line per outer token:
//! `token<TAB>other<TAB>count<TAB>other2<TAB>count2...`, with the inner
//! entries ordered by descending count.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt,
    fs::File,
    io::{BufRead, BufReader, Read, Write},
    ops::{Add, AddAssign},
    path::Path,
    str::FromStr,
};

use tracing::{debug, info};

use crate::{
    data::idf::parse_num_docs,
    error::{Error, Result},
};

/// Numeric aggregate held in a [`CountStore`].
pub trait CountValue:
    Copy
    + Default
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Send
    + Sync
    + 'static
{
    /// Whether fractional weights are truncated by this type.
    const INTEGRAL: bool;

    fn one() -> Self;

    fn from_weight(weight: f64) -> Self;

    fn as_f64(self) -> f64;
}

impl CountValue for u64 {
    const INTEGRAL: bool = true;

    fn one() -> Self {
        1
    }

    fn from_weight(weight: f64) -> Self {
        weight.round().max(0.0) as u64
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl CountValue for f64 {
    const INTEGRAL: bool = false;

    fn one() -> Self {
        1.0
    }

    fn from_weight(weight: f64) -> Self {
        weight
    }

    fn as_f64(self) -> f64 {
        self
    }
}

/// Order two tokens the way the store keys them.
pub fn canonical_order<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Two-level sparse map from unordered token pairs to aggregates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountStore<V> {
    counts: BTreeMap<String, HashMap<String, V>>,
    num_docs: u64,
}

impl<V: CountValue> CountStore<V> {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
            num_docs: 0,
        }
    }

    pub fn increment(&mut self, a: &str, b: &str, by: V) {
        let (first, second) = canonical_order(a, b);
        *self
            .counts
            .entry(first.to_string())
            .or_default()
            .entry(second.to_string())
            .or_default() += by;
    }

    pub fn set(&mut self, a: &str, b: &str, value: V) {
        let (first, second) = canonical_order(a, b);
        self.counts
            .entry(first.to_string())
            .or_default()
            .insert(second.to_string(), value);
    }

    /// Aggregate for the pair, zero when absent.
    pub fn get(&self, a: &str, b: &str) -> V {
        let (first, second) = canonical_order(a, b);
        self.counts
            .get(first)
            .and_then(|inner| inner.get(second))
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        let (first, second) = canonical_order(a, b);
        self.counts
            .get(first)
            .is_some_and(|inner| inner.contains_key(second))
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn set_num_docs(&mut self, num_docs: u64) {
        self.num_docs = num_docs;
    }

    pub fn add_docs(&mut self, docs: u64) {
        self.num_docs += docs;
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.counts.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All pairs, outer tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, V)> + '_ {
        self.counts.iter().flat_map(|(first, inner)| {
            inner
                .iter()
                .map(move |(second, value)| (first.as_str(), second.as_str(), *value))
        })
    }

    /// Inner entries of one outer token, descending by value then by token.
    pub fn sorted_row(&self, first: &str) -> Vec<(&str, V)> {
        let mut row: Vec<(&str, V)> = self
            .counts
            .get(first)
            .map(|inner| inner.iter().map(|(k, v)| (k.as_str(), *v)).collect())
            .unwrap_or_default();
        row.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        row
    }

    /// Sum over all pairs.
    pub fn total(&self) -> V {
        self.iter().fold(V::default(), |acc, (_, _, v)| acc + v)
    }

    /// Per-token sum over every pair the token takes part in.
    pub fn marginals(&self) -> HashMap<String, V> {
        let mut sums: HashMap<String, V> = HashMap::new();
        for (a, b, v) in self.iter() {
            *sums.entry(a.to_string()).or_default() += v;
            *sums.entry(b.to_string()).or_default() += v;
        }
        sums
    }

    /// Everything `token` is paired with, whichever side it is stored on.
    pub fn reconstruct_vector(&self, token: &str) -> HashMap<String, V> {
        let mut vector: HashMap<String, V> = self
            .counts
            .get(token)
            .cloned()
            .unwrap_or_default();
        for (first, inner) in self.counts.iter().take_while(|(first, _)| first.as_str() < token) {
            if let Some(value) = inner.get(token) {
                vector.insert(first.clone(), *value);
            }
        }
        vector
    }

    /// Add another store into this one, document totals included.
    pub fn merge(&mut self, other: &CountStore<V>) {
        for (first, inner) in &other.counts {
            let ours = self.counts.entry(first.clone()).or_default();
            for (second, value) in inner {
                *ours.entry(second.clone()).or_default() += *value;
            }
        }
        self.num_docs += other.num_docs;
    }

    /// Drop every pair whose aggregate is at most `cutoff`; returns how many
    /// were removed.
    pub fn trim(&mut self, cutoff: V) -> usize {
        let before = self.len();
        for inner in self.counts.values_mut() {
            inner.retain(|_, value| *value > cutoff);
        }
        self.counts.retain(|_, inner| !inner.is_empty());
        let removed = before - self.len();
        debug!(removed, remaining = before - removed, "trimmed pair counts");
        removed
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .flexible(true)
            .from_writer(writer);
        out.write_record([format!("NUMDOCS {}", self.num_docs)])?;
        for first in self.counts.keys() {
            let row = self.sorted_row(first);
            if row.is_empty() {
                continue;
            }
            let mut record = Vec::with_capacity(1 + 2 * row.len());
            record.push(first.clone());
            for (second, value) in row {
                record.push(second.to_string());
                record.push(value.to_string());
            }
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();
        let mut store = Self::new();
        store.num_docs = match lines.next() {
            Some(line) => parse_num_docs(&line?)?,
            None => return Err(Error::parse("empty count file")),
        };
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut cols = line.split('\t');
            let first = cols.next().unwrap_or_default();
            let rest: Vec<&str> = cols.collect();
            if rest.len() % 2 != 0 {
                return Err(Error::parse(format!("dangling column in count row {first:?}")));
            }
            for pair in rest.chunks(2) {
                let value: V = pair[1]
                    .parse()
                    .map_err(|_| Error::parse(format!("bad count {:?} for {first:?}", pair[1])))?;
                store.increment(first, pair[0], value);
            }
        }
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write_to(File::create(path)?)?;
        info!(path = %path.display(), pairs = self.len(), docs = self.num_docs, "wrote pair counts");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let store = Self::read_from(File::open(path)?)?;
        info!(path = %path.display(), pairs = store.len(), docs = store.num_docs, "loaded pair counts");
        Ok(store)
    }
}
