//! Event-pair counting.
//!
//! One [`PairCounter`] handles every counting policy through [`ScoringMode`]:
//! exact shared-argument matches, sentence-distance decay, and count-all.
//! Per-document bookkeeping lives in a scope object created for each call to
//! [`PairCounter::process_document`], so nothing leaks between documents.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::File,
    io::{Read, Write},
    path::Path,
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::decay::{scaled_distance, sentence_distance};
use crate::{
    data::{
        counts::{CountStore, CountValue},
        idf::{IdfMap, Informativeness},
    },
    error::{Error, Result},
    nlp::events::Event,
};

/// Role pattern recorded for pairs counted without an argument match.
pub const ANY_ROLES: &str = "*:*";

/// Counting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ScoringMode {
    /// Pairs must share a coreferent argument; integer counts.
    #[default]
    ExactCoref,
    /// Any two events, weighted by sentence distance; float counts.
    DistanceDecay,
    /// Any two events within the window; integer counts.
    CountAll,
}

/// Swap the halves of a `left:right` role pattern.
pub fn swap_roles(roles: &str) -> String {
    match roles.split_once(':') {
        Some((left, right)) => format!("{right}:{left}"),
        None => roles.to_string(),
    }
}

/// Canonical unordered pair with its role pattern. Tokens are sorted; when
/// that reverses the input order the role halves are swapped with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub first: String,
    pub second: String,
    pub roles: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str, roles: &str) -> Self {
        if a <= b {
            Self {
                first: a.to_string(),
                second: b.to_string(),
                roles: roles.to_string(),
            }
        } else {
            Self {
                first: b.to_string(),
                second: a.to_string(),
                roles: swap_roles(roles),
            }
        }
    }

    fn tokens(&self) -> (String, String) {
        (self.first.clone(), self.second.clone())
    }
}

/// Canonical three-token key: tokens sorted, roles rearranged to follow them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripleKey {
    pub tokens: [String; 3],
    pub roles: String,
}

impl TripleKey {
    pub fn new(mut members: [(&str, &str); 3]) -> Self {
        members.sort_by(|a, b| a.0.cmp(b.0));
        Self {
            tokens: members.map(|(token, _)| token.to_string()),
            roles: format!("{}:{}:{}", members[0].1, members[1].1, members[2].1),
        }
    }
}

/// Role patterns observed per canonical pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolePatterns {
    patterns: HashMap<(String, String), BTreeMap<String, u64>>,
}

impl RolePatterns {
    pub fn record(&mut self, key: &PairKey) {
        self.add(key, 1);
    }

    fn add(&mut self, key: &PairKey, count: u64) {
        *self
            .patterns
            .entry(key.tokens())
            .or_default()
            .entry(key.roles.clone())
            .or_default() += count;
    }

    /// Patterns for `a` and `b`, oriented so the left half belongs to `a`.
    pub fn get(&self, a: &str, b: &str) -> BTreeMap<String, u64> {
        let swapped = a > b;
        let key = if swapped {
            (b.to_string(), a.to_string())
        } else {
            (a.to_string(), b.to_string())
        };
        match self.patterns.get(&key) {
            Some(found) if swapped => found
                .iter()
                .map(|(roles, count)| (swap_roles(roles), *count))
                .collect(),
            Some(found) => found.clone(),
            None => BTreeMap::new(),
        }
    }

    pub fn merge(&mut self, other: &RolePatterns) {
        for ((first, second), patterns) in &other.patterns {
            for (roles, count) in patterns {
                self.add(&PairKey::new(first, second, roles), *count);
            }
        }
    }

    pub fn retain_pairs<F: FnMut(&str, &str) -> bool>(&mut self, mut keep: F) {
        self.patterns.retain(|(a, b), _| keep(a, b));
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Rows of `first<TAB>second<TAB>roles<TAB>count`, sorted.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = tsv_writer(writer);
        let sorted: BTreeMap<_, _> = self.patterns.iter().collect();
        for ((first, second), patterns) in sorted {
            for (roles, count) in patterns {
                out.write_record([first, second, roles, &count.to_string()])?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Read rows written by [`RolePatterns::write_to`].
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut patterns = Self::default();
        for record in tsv_reader(reader).records() {
            let record = record?;
            let [first, second, roles, count] = fields::<4>(&record, "role pattern")?;
            let count = count
                .parse()
                .map_err(|_| Error::parse(format!("bad pattern count {count:?}")))?;
            patterns.add(&PairKey::new(first, second, roles), count);
        }
        Ok(patterns)
    }
}

/// Provenance of one counted pair: document and event indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairLink {
    pub doc_id: String,
    pub source: usize,
    pub target: usize,
}

/// Everything a counting run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PairCounts<V> {
    pub pairs: CountStore<V>,
    pub patterns: RolePatterns,
    pub triples: HashMap<TripleKey, u64>,
    pub links: Vec<PairLink>,
}

impl<V: CountValue> Default for PairCounts<V> {
    fn default() -> Self {
        Self {
            pairs: CountStore::new(),
            patterns: RolePatterns::default(),
            triples: HashMap::new(),
            links: Vec::new(),
        }
    }
}

impl<V: CountValue> PairCounts<V> {
    pub fn get(&self, a: &str, b: &str) -> V {
        self.pairs.get(a, b)
    }

    /// Trigram count over every role pattern, in any token order.
    pub fn triple_count(&self, a: &str, b: &str, c: &str) -> u64 {
        let mut tokens = [a, b, c];
        tokens.sort_unstable();
        self.triples
            .iter()
            .filter(|(key, _)| key.tokens.iter().map(String::as_str).eq(tokens))
            .map(|(_, count)| *count)
            .sum()
    }

    /// Combine another worker's output into this one.
    pub fn merge(&mut self, other: PairCounts<V>) {
        self.pairs.merge(&other.pairs);
        self.patterns.merge(&other.patterns);
        for (key, count) in other.triples {
            *self.triples.entry(key).or_default() += count;
        }
        self.links.extend(other.links);
    }

    /// Prune pairs (and trigrams) at or below `cutoff`. Patterns of removed
    /// pairs go with them.
    pub fn trim(&mut self, cutoff: V) -> usize {
        let removed = self.pairs.trim(cutoff);
        let pairs = &self.pairs;
        self.patterns.retain_pairs(|a, b| pairs.contains(a, b));
        self.triples
            .retain(|_, count| (*count as f64) > cutoff.as_f64());
        removed
    }

    /// Write the count file plus `.roles`, `.triples` and `.links` side files
    /// when they have content.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.pairs.save(path)?;
        for extension in ["roles", "triples", "links"] {
            remove_side_file(path, extension)?;
        }
        if !self.patterns.is_empty() {
            self.patterns
                .write_to(File::create(path.with_extension("roles"))?)?;
        }
        if !self.triples.is_empty() {
            let mut out = tsv_writer(File::create(path.with_extension("triples"))?);
            let sorted: BTreeMap<_, _> = self.triples.iter().collect();
            for (key, count) in sorted {
                out.write_record([
                    key.tokens[0].as_str(),
                    key.tokens[1].as_str(),
                    key.tokens[2].as_str(),
                    key.roles.as_str(),
                    count.to_string().as_str(),
                ])?;
            }
            out.flush()?;
        }
        if !self.links.is_empty() {
            let mut out = tsv_writer(File::create(path.with_extension("links"))?);
            for link in &self.links {
                out.write_record([
                    link.doc_id.clone(),
                    link.source.to_string(),
                    link.target.to_string(),
                ])?;
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Read a count file back together with whichever side files
    /// [`PairCounts::save`] wrote next to it.
    pub fn load(path: &Path) -> Result<Self> {
        let mut counts = Self {
            pairs: CountStore::load(path)?,
            ..Self::default()
        };
        if let Some(file) = side_file(path, "roles") {
            counts.patterns = RolePatterns::read_from(file)?;
        }
        if let Some(file) = side_file(path, "triples") {
            for record in tsv_reader(file).records() {
                let record = record?;
                let [a, b, c, roles, count] = fields::<5>(&record, "trigram")?;
                let count: u64 = count
                    .parse()
                    .map_err(|_| Error::parse(format!("bad trigram count {count:?}")))?;
                let key = TripleKey {
                    tokens: [a.to_string(), b.to_string(), c.to_string()],
                    roles: roles.to_string(),
                };
                *counts.triples.entry(key).or_default() += count;
            }
        }
        if let Some(file) = side_file(path, "links") {
            for record in tsv_reader(file).records() {
                let record = record?;
                let [doc_id, source, target] = fields::<3>(&record, "link")?;
                let index = |field: &str| -> Result<usize> {
                    field
                        .parse()
                        .map_err(|_| Error::parse(format!("bad event index {field:?}")))
                };
                counts.links.push(PairLink {
                    doc_id: doc_id.to_string(),
                    source: index(source)?,
                    target: index(target)?,
                });
            }
        }
        Ok(counts)
    }
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

fn fields<'r, const N: usize>(record: &'r csv::StringRecord, what: &str) -> Result<[&'r str; N]> {
    if record.len() != N {
        return Err(Error::parse(format!(
            "{what} row with {} columns, expected {N}",
            record.len()
        )));
    }
    Ok(std::array::from_fn(|idx| &record[idx]))
}

fn side_file(path: &Path, extension: &str) -> Option<File> {
    File::open(path.with_extension(extension)).ok()
}

fn remove_side_file(path: &Path, extension: &str) -> Result<()> {
    match std::fs::remove_file(path.with_extension(extension)) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(writer)
}

/// Prune every `every` documents, dropping aggregates at or below `cutoff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneSchedule<V> {
    pub every: u64,
    pub cutoff: V,
}

/// Knobs for a [`PairCounter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterOptions<V> {
    pub mode: ScoringMode,
    /// Partners of the event at index `i` lie in `(i, i + 1 + window]`,
    /// measured on the document's full event sequence in every mode. A
    /// window of 0 pairs adjacent events only.
    pub window: usize,
    pub trigrams: bool,
    pub links: bool,
    pub gate: Informativeness,
    pub prune: Option<PruneSchedule<V>>,
}

impl<V: CountValue> Default for CounterOptions<V> {
    fn default() -> Self {
        Self {
            mode: ScoringMode::default(),
            window: usize::MAX,
            trigrams: false,
            links: false,
            gate: Informativeness::default(),
            prune: None,
        }
    }
}

#[derive(Default)]
struct DocumentScope {
    pairs: HashSet<(String, String)>,
    triples: HashSet<TripleKey>,
}

/// Streaming pair counter over one corpus partition.
pub struct PairCounter<V> {
    options: CounterOptions<V>,
    idf: Arc<IdfMap>,
    counts: PairCounts<V>,
    documents: u64,
}

impl<V: CountValue> PairCounter<V> {
    pub fn new(options: CounterOptions<V>, idf: Arc<IdfMap>) -> Result<Self> {
        if options.mode == ScoringMode::DistanceDecay && V::INTEGRAL {
            return Err(Error::configuration(
                "distance decay needs fractional counts",
            ));
        }
        if options.trigrams && options.mode != ScoringMode::ExactCoref {
            return Err(Error::configuration(
                "trigram counting requires the exact-coref mode",
            ));
        }
        Ok(Self {
            options,
            idf,
            counts: PairCounts::default(),
            documents: 0,
        })
    }

    pub fn options(&self) -> &CounterOptions<V> {
        &self.options
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn counts(&self) -> &PairCounts<V> {
        &self.counts
    }

    /// Count one document's events (sentence order, then word order) and
    /// return how many pairs it contributed. Runs a scheduled prune when due.
    pub fn process_document(&mut self, doc_id: &str, events: &[Event]) -> usize {
        let counted = match self.options.mode {
            ScoringMode::ExactCoref | ScoringMode::CountAll => self.count_within_window(doc_id, events),
            ScoringMode::DistanceDecay => self.count_by_distance(events),
        };
        self.documents += 1;
        self.counts.pairs.add_docs(1);

        if let Some(schedule) = self.options.prune {
            if schedule.every > 0 && self.documents % schedule.every == 0 {
                let removed = self.counts.trim(schedule.cutoff);
                debug!(documents = self.documents, removed, "scheduled prune");
            }
        }
        counted
    }

    /// Prune now with the scheduled cutoff (or a caller-supplied one).
    pub fn prune(&mut self, cutoff: V) -> usize {
        self.counts.trim(cutoff)
    }

    pub fn finish(self) -> PairCounts<V> {
        info!(
            documents = self.documents,
            pairs = self.counts.pairs.len(),
            "finished counting"
        );
        self.counts
    }

    fn admits(&self, token: &str) -> bool {
        self.options.gate.admits(&self.idf, token)
    }

    fn count_within_window(&mut self, doc_id: &str, events: &[Event]) -> usize {
        let exact = self.options.mode == ScoringMode::ExactCoref;
        let candidates: Vec<(usize, &Event)> = events
            .iter()
            .enumerate()
            .filter(|(_, event)| !exact || event.has_arguments())
            .collect();

        let mut scope = DocumentScope::default();
        let mut counted = 0;
        let n = candidates.len();
        for i in 0..n.saturating_sub(1) {
            let (source_id, source) = candidates[i];
            if !source.is_collocation() && !self.admits(&source.token) {
                continue;
            }
            let limit = source_id.saturating_add(1).saturating_add(self.options.window);
            let end = candidates.partition_point(|&(id, _)| id <= limit);
            for j in (i + 1)..end {
                let (target_id, target) = candidates[j];
                if target.token == source.token
                    || (target.sentence, target.position) == (source.sentence, source.position)
                {
                    continue;
                }
                if !self.admits(&target.token) {
                    continue;
                }
                let roles = if exact {
                    match shared_argument(source, target) {
                        Some(roles) => roles,
                        None => continue,
                    }
                } else {
                    ANY_ROLES.to_string()
                };

                let key = PairKey::new(&source.token, &target.token, &roles);
                if !scope.pairs.insert(key.tokens()) {
                    continue;
                }
                self.counts.pairs.increment(&key.first, &key.second, V::one());
                self.counts.patterns.record(&key);
                if self.options.links {
                    self.counts.links.push(PairLink {
                        doc_id: doc_id.to_string(),
                        source: source_id,
                        target: target_id,
                    });
                }
                counted += 1;

                if self.options.trigrams {
                    self.count_triples(&candidates, i, j, &roles, end, &mut scope);
                }
            }
        }
        counted
    }

    /// Extend the `i`-`j` pair with later events in the window that share an
    /// argument with `j` in the same role `j` had in the pair.
    fn count_triples(
        &mut self,
        candidates: &[(usize, &Event)],
        i: usize,
        j: usize,
        roles: &str,
        end: usize,
        scope: &mut DocumentScope,
    ) {
        let (_, first) = candidates[i];
        let (_, second) = candidates[j];
        let Some((first_role, second_role)) = roles.split_once(':') else {
            return;
        };
        for &(_, third) in &candidates[(j + 1)..end] {
            if third.token == first.token
                || third.token == second.token
                || (third.sentence, third.position) == (second.sentence, second.position)
                || !self.admits(&third.token)
            {
                continue;
            }
            let Some(third_role) = second
                .arguments
                .iter()
                .filter(|(_, role)| role.as_str() == second_role)
                .find_map(|(entity, _)| third.arguments.get(entity))
            else {
                continue;
            };
            let key = TripleKey::new([
                (first.token.as_str(), first_role),
                (second.token.as_str(), second_role),
                (third.token.as_str(), third_role.as_str()),
            ]);
            if scope.triples.insert(key.clone()) {
                *self.counts.triples.entry(key).or_default() += 1;
            }
        }
    }

    fn count_by_distance(&mut self, events: &[Event]) -> usize {
        let positions: Vec<&Event> = events
            .iter()
            .filter(|event| event.has_arguments() && self.admits(&event.token))
            .collect();

        let mut nearest: HashMap<(&str, &str), usize> = HashMap::new();
        for (a, left) in positions.iter().enumerate() {
            for right in &positions[(a + 1)..] {
                if left.token == right.token {
                    continue;
                }
                let key = if left.token <= right.token {
                    (left.token.as_str(), right.token.as_str())
                } else {
                    (right.token.as_str(), left.token.as_str())
                };
                let distance = sentence_distance(left.sentence, right.sentence);
                nearest
                    .entry(key)
                    .and_modify(|d| *d = (*d).min(distance))
                    .or_insert(distance);
            }
        }

        let counted = nearest.len();
        for ((a, b), distance) in nearest {
            self.counts
                .pairs
                .increment(a, b, V::from_weight(scaled_distance(distance)));
        }
        counted
    }
}

/// Role pattern `role_a:role_b` of the first entity (in `a`'s binding order)
/// that both events take as an argument.
pub fn shared_argument(a: &Event, b: &Event) -> Option<String> {
    a.arguments.iter().find_map(|(entity, role_a)| {
        b.arguments
            .get(entity)
            .map(|role_b| format!("{role_a}:{role_b}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::events::PosClass;

    fn verb(token: &str, sentence: usize, position: usize) -> Event {
        Event::new(token, PosClass::Verb, sentence, position)
    }

    fn open_options<V: CountValue>(mode: ScoringMode) -> CounterOptions<V> {
        CounterOptions {
            mode,
            gate: Informativeness::permissive(),
            ..CounterOptions::default()
        }
    }

    #[test]
    fn pair_key_swaps_roles_with_tokens() {
        let key = PairKey::new("v-charge", "v-arrest", "o:s");
        assert_eq!(key.first, "v-arrest");
        assert_eq!(key.second, "v-charge");
        assert_eq!(key.roles, "s:o");
        assert_eq!(key, PairKey::new("v-arrest", "v-charge", "s:o"));
    }

    #[test]
    fn triple_key_rearranges_roles() {
        let key = TripleKey::new([("v-convict", "o"), ("v-arrest", "o"), ("v-charge", "s")]);
        assert_eq!(key.tokens, ["v-arrest", "v-charge", "v-convict"]);
        assert_eq!(key.roles, "o:s:o");
    }

    #[test]
    fn shared_argument_follows_binding_order() {
        let a = verb("v-a", 0, 1).with_argument(9, "s").with_argument(2, "o");
        let b = verb("v-b", 0, 3).with_argument(2, "p").with_argument(9, "o");
        assert_eq!(shared_argument(&a, &b).as_deref(), Some("s:o"));
        assert_eq!(shared_argument(&b, &a).as_deref(), Some("p:o"));
        assert_eq!(shared_argument(&a, &verb("v-c", 0, 4)), None);
    }

    #[test]
    fn counts_once_per_document() {
        let idf = Arc::new(IdfMap::new());
        let mut counter = PairCounter::<u64>::new(open_options(ScoringMode::ExactCoref), idf).unwrap();
        let events = vec![
            verb("v-arrest", 0, 2).with_argument(7, "s"),
            verb("v-charge", 0, 5).with_argument(7, "o"),
            verb("v-arrest", 1, 2).with_argument(7, "s"),
            verb("v-charge", 1, 6).with_argument(7, "o"),
        ];
        assert_eq!(counter.process_document("d1", &events), 1);
        assert_eq!(counter.counts().get("v-charge", "v-arrest"), 1);
        counter.process_document("d2", &events);
        assert_eq!(counter.counts().get("v-arrest", "v-charge"), 2);
        assert_eq!(counter.counts().pairs.num_docs(), 2);
    }

    #[test]
    fn window_limits_partners() {
        let idf = Arc::new(IdfMap::new());
        let options = CounterOptions {
            window: 1,
            ..open_options(ScoringMode::CountAll)
        };
        let mut counter = PairCounter::<u64>::new(options, idf).unwrap();
        let events = vec![
            verb("v-a", 0, 1),
            verb("v-b", 0, 2),
            verb("v-c", 0, 3),
            verb("v-d", 0, 4),
        ];
        assert_eq!(counter.process_document("d", &events), 5);
        assert_eq!(counter.counts().get("v-a", "v-b"), 1);
        assert_eq!(counter.counts().get("v-a", "v-c"), 1);
        assert_eq!(counter.counts().get("v-a", "v-d"), 0);
        assert_eq!(counter.counts().patterns.get("v-b", "v-c")[ANY_ROLES], 1);
    }

    #[test]
    fn zero_window_pairs_adjacent_events() {
        let idf = Arc::new(IdfMap::new());
        let options = CounterOptions {
            window: 0,
            ..open_options(ScoringMode::CountAll)
        };
        let mut counter = PairCounter::<u64>::new(options, idf).unwrap();
        let events = vec![verb("v-a", 0, 1), verb("v-b", 0, 2), verb("v-c", 0, 3)];
        assert_eq!(counter.process_document("d", &events), 2);
        assert_eq!(counter.counts().get("v-b", "v-c"), 1);
        assert_eq!(counter.counts().get("v-a", "v-c"), 0);
    }

    #[test]
    fn window_spans_argumentless_events_in_exact_mode() {
        let idf = Arc::new(IdfMap::new());
        let options = CounterOptions {
            window: 0,
            ..open_options(ScoringMode::ExactCoref)
        };
        let mut counter = PairCounter::<u64>::new(options, idf).unwrap();
        let events = vec![
            verb("v-arrest", 0, 1).with_argument(4, "o"),
            verb("v-say", 0, 3),
            verb("v-charge", 0, 5).with_argument(4, "o"),
        ];
        assert_eq!(counter.process_document("d", &events), 0);
        let wider = CounterOptions {
            window: 1,
            ..open_options(ScoringMode::ExactCoref)
        };
        let mut counter = PairCounter::<u64>::new(wider, Arc::new(IdfMap::new())).unwrap();
        assert_eq!(counter.process_document("d", &events), 1);
    }

    #[test]
    fn saved_counts_load_with_side_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.counts");
        let options = CounterOptions {
            trigrams: true,
            links: true,
            ..open_options(ScoringMode::ExactCoref)
        };
        let mut counter = PairCounter::<u64>::new(options, Arc::new(IdfMap::new())).unwrap();
        let events = vec![
            verb("v-arrest", 0, 1).with_argument(4, "s"),
            verb("v-charge", 0, 3).with_argument(4, "o"),
            verb("v-convict", 1, 2).with_argument(4, "o"),
        ];
        counter.process_document("d1", &events);
        let counts = counter.finish();
        counts.save(&path).unwrap();

        let back = PairCounts::<u64>::load(&path).unwrap();
        assert_eq!(back, counts);
        assert_eq!(back.patterns.get("v-charge", "v-arrest")["o:s"], 1);
        assert_eq!(back.triple_count("v-arrest", "v-charge", "v-convict"), 1);
        assert_eq!(back.links.len(), 3);
    }

    #[test]
    fn exact_mode_drops_argumentless_events() {
        let idf = Arc::new(IdfMap::new());
        let mut exact = PairCounter::<u64>::new(open_options(ScoringMode::ExactCoref), idf.clone()).unwrap();
        let mut all = PairCounter::<u64>::new(open_options(ScoringMode::CountAll), idf).unwrap();
        let events = vec![verb("v-a", 0, 1), verb("v-b", 0, 2).with_argument(1, "s")];
        assert_eq!(exact.process_document("d", &events), 0);
        assert_eq!(all.process_document("d", &events), 1);
    }

    #[test]
    fn collocations_bypass_the_gate_as_sources() {
        let mut idf = IdfMap::new();
        for doc in 0..40 {
            if doc < 20 {
                idf.count_document(["v-charge"]);
            } else {
                idf.count_document(["v-other"]);
            }
        }
        idf.calculate_idf();
        let options = CounterOptions {
            gate: Informativeness::new(10, 0.5),
            ..CounterOptions::default()
        };
        let mut counter = PairCounter::<u64>::new(options, Arc::new(idf)).unwrap();
        let mut give_up = verb("v-give_up", 0, 1).with_argument(3, "s");
        give_up.particle = Some("up".into());
        let events = vec![give_up, verb("v-charge", 0, 4).with_argument(3, "o")];
        assert_eq!(counter.process_document("d", &events), 1);

        let reversed = vec![
            verb("v-charge", 0, 1).with_argument(3, "s"),
            verb("v-give_up", 0, 4).with_argument(3, "o"),
        ];
        assert_eq!(counter.process_document("d2", &reversed), 0);
    }

    #[test]
    fn trigrams_follow_the_middle_role() {
        let idf = Arc::new(IdfMap::new());
        let options = CounterOptions {
            trigrams: true,
            ..open_options(ScoringMode::ExactCoref)
        };
        let mut counter = PairCounter::<u64>::new(options, idf).unwrap();
        let events = vec![
            verb("v-arrest", 0, 1).with_argument(4, "o"),
            verb("v-charge", 0, 3).with_argument(4, "o"),
            verb("v-convict", 1, 2).with_argument(4, "o"),
            verb("v-flee", 1, 5).with_argument(8, "s"),
        ];
        counter.process_document("d", &events);
        let counts = counter.finish();
        assert_eq!(counts.triple_count("v-convict", "v-arrest", "v-charge"), 1);
        assert_eq!(counts.triple_count("v-arrest", "v-charge", "v-flee"), 0);
    }

    #[test]
    fn distance_decay_keeps_nearest_occurrence() {
        let idf = Arc::new(IdfMap::new());
        let mut counter = PairCounter::<f64>::new(open_options(ScoringMode::DistanceDecay), idf).unwrap();
        let events = vec![
            verb("v-raid", 0, 1).with_argument(1, "s"),
            verb("v-seize", 1, 1).with_argument(2, "o"),
            verb("v-seize", 5, 1).with_argument(2, "o"),
            verb("v-flee", 9, 1).with_argument(3, "s"),
        ];
        assert_eq!(counter.process_document("d", &events), 3);
        assert!((counter.counts().get("v-raid", "v-seize") - 0.5).abs() < 1e-12);
        assert!((counter.counts().get("v-flee", "v-seize") - 0.05).abs() < 1e-12);
        counter.process_document("d2", &events);
        assert!((counter.counts().get("v-raid", "v-seize") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_incompatible_options() {
        let idf = Arc::new(IdfMap::new());
        assert!(PairCounter::<u64>::new(open_options(ScoringMode::DistanceDecay), idf.clone()).is_err());
        let trigram_all = CounterOptions {
            trigrams: true,
            ..open_options(ScoringMode::CountAll)
        };
        assert!(PairCounter::<u64>::new(trigram_all, idf).is_err());
    }

    #[test]
    fn scheduled_prune_runs_on_boundaries() {
        let idf = Arc::new(IdfMap::new());
        let options = CounterOptions {
            prune: Some(PruneSchedule { every: 2, cutoff: 1 }),
            ..open_options(ScoringMode::CountAll)
        };
        let mut counter = PairCounter::<u64>::new(options, idf).unwrap();
        counter.process_document("d1", &[verb("v-a", 0, 1), verb("v-b", 0, 2)]);
        assert_eq!(counter.counts().get("v-a", "v-b"), 1);
        counter.process_document("d2", &[verb("v-c", 0, 1), verb("v-d", 0, 2)]);
        assert_eq!(counter.counts().pairs.len(), 0);
        assert!(counter.counts().patterns.is_empty());
    }
}
