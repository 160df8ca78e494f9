//! Event extraction: canonical predicate tokens from one parsed sentence.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    lexicon::{Lemmatizer, NounEvents},
    parse::{DependencyEdge, ParseTree},
};

/// Coreference cluster identifier.
pub type EntityId = u32;

/// Stand-in lemma for purely numeric tokens.
pub const NUMERAL: &str = "<num>";

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[\d,]*\.?\d+(?:[eE][-+]?\d+)?$").expect("valid regex"));

/// Coarse part-of-speech class, derived from the Penn tag prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PosClass {
    Verb,
    Noun,
    Adjective,
    Pronoun,
    Other,
}

impl PosClass {
    pub fn from_tag(tag: &str) -> Self {
        if tag.starts_with("VB") {
            Self::Verb
        } else if tag.starts_with("NN") {
            Self::Noun
        } else if tag.starts_with('J') {
            Self::Adjective
        } else if tag.starts_with("PRP") {
            Self::Pronoun
        } else {
            Self::Other
        }
    }

    /// Prefix character used in canonical tokens (`v-arrest`).
    pub fn as_char(self) -> char {
        match self {
            Self::Verb => 'v',
            Self::Noun => 'n',
            Self::Adjective => 'j',
            Self::Pronoun => 'p',
            Self::Other => 'o',
        }
    }
}

/// Which predicates count as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenFilter {
    Verbs,
    Nouns,
    VerbsAndNouns,
    /// Verbs plus nouns the [`NounEvents`] collaborator accepts.
    #[default]
    VerbsAndNominals,
    All,
    /// Verbs and nouns as bare lemmas, without particle compounds.
    Base,
}

impl TokenFilter {
    fn admits(self, class: PosClass) -> bool {
        match self {
            Self::Verbs => class == PosClass::Verb,
            Self::Nouns => class == PosClass::Noun,
            Self::VerbsAndNouns | Self::VerbsAndNominals | Self::Base => {
                matches!(class, PosClass::Verb | PosClass::Noun)
            }
            Self::All => true,
        }
    }
}

/// Knobs for [`EventExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub filter: TokenFilter,
    pub use_lemmas: bool,
    /// Emit one event per governor edge instead of one per governor.
    pub expand_relations: bool,
    /// Keep the preposition type in `p_<type>` roles.
    pub full_prep: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            filter: TokenFilter::default(),
            use_lemmas: true,
            expand_relations: false,
            full_prep: false,
        }
    }
}

/// A predicate occurrence with its bound entity arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// POS-class prefixed lemma, e.g. `v-arrest` or `v-give_up`.
    pub token: String,
    pub pos: PosClass,
    pub sentence: usize,
    /// 1-based word index of the predicate.
    pub position: usize,
    pub particle: Option<String>,
    /// Raw relation this event is restricted to in relation-expansion mode.
    pub relation: Option<String>,
    /// Entity → role, in binding order.
    pub arguments: IndexMap<EntityId, String>,
}

impl Event {
    pub fn new(token: impl Into<String>, pos: PosClass, sentence: usize, position: usize) -> Self {
        Self {
            token: token.into(),
            pos,
            sentence,
            position,
            particle: None,
            relation: None,
            arguments: IndexMap::new(),
        }
    }

    /// Builder-style argument binding, mainly for tests and synthetic input.
    pub fn with_argument(mut self, entity: EntityId, role: impl Into<String>) -> Self {
        self.arguments.entry(entity).or_insert_with(|| role.into());
        self
    }

    /// Particle compounds are treated as collocations and skip the
    /// informativeness gate as pair sources.
    pub fn is_collocation(&self) -> bool {
        self.particle.is_some()
    }

    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.token, self.sentence, self.position)
    }
}

/// Turns dependency edges of one sentence into canonical events.
pub struct EventExtractor<'a> {
    options: ExtractOptions,
    lemmatizer: &'a dyn Lemmatizer,
    nouns: &'a dyn NounEvents,
}

impl<'a> EventExtractor<'a> {
    pub fn new(
        options: ExtractOptions,
        lemmatizer: &'a dyn Lemmatizer,
        nouns: &'a dyn NounEvents,
    ) -> Self {
        Self {
            options,
            lemmatizer,
            nouns,
        }
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Events of one sentence, ordered by word position.
    pub fn extract(&self, sentence: usize, tree: &ParseTree, edges: &[DependencyEdge]) -> Vec<Event> {
        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for edge in edges {
            let index = edge.governor_index;
            if index == 0 {
                continue;
            }
            if !self.options.expand_relations && !seen.insert(index) {
                continue;
            }
            let Some(mut event) = self.event_at(sentence, index, &edge.governor, tree, edges) else {
                continue;
            };
            if self.options.expand_relations {
                event.relation = Some(edge.relation.clone());
            }
            events.push(event);
        }
        events.sort_by_key(|event| event.position);
        events
    }

    fn event_at(
        &self,
        sentence: usize,
        index: usize,
        surface: &str,
        tree: &ParseTree,
        edges: &[DependencyEdge],
    ) -> Option<Event> {
        let tag = tree.pos_at(index)?;
        let class = PosClass::from_tag(tag);
        if !self.options.filter.admits(class) {
            return None;
        }

        let mut lemma = self.lemma(surface, tag);
        if self.options.filter == TokenFilter::VerbsAndNominals
            && class == PosClass::Noun
            && !self.nouns.is_noun_event(&lemma)
        {
            return None;
        }

        let particle = if class == PosClass::Verb && self.options.filter != TokenFilter::Base {
            edges
                .iter()
                .find(|e| e.relation == "prt" && e.governor_index == index)
                .map(|e| e.dependent.to_lowercase())
        } else {
            None
        };
        if let Some(particle) = &particle {
            lemma = format!("{lemma}_{particle}");
        }

        let mut event = Event::new(format!("{}-{lemma}", class.as_char()), class, sentence, index);
        event.particle = particle;
        Some(event)
    }

    fn lemma(&self, surface: &str, tag: &str) -> String {
        if NUMERIC.is_match(surface) {
            return NUMERAL.to_string();
        }
        if self.options.use_lemmas {
            if let Some(lemma) = self.lemmatizer.lemmatize(surface, tag) {
                return lemma.to_lowercase();
            }
        }
        surface.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::lexicon::{LemmaTable, NounEventList};

    fn sentence() -> (ParseTree, Vec<DependencyEdge>) {
        // Police arrested him and gave up the search after the trial .
        let tree = ParseTree::from_tagged([
            ("NNS", "Police"),
            ("VBD", "arrested"),
            ("PRP", "him"),
            ("CC", "and"),
            ("VBD", "gave"),
            ("RP", "up"),
            ("DT", "the"),
            ("NN", "search"),
            ("IN", "after"),
            ("DT", "the"),
            ("NN", "trial"),
        ]);
        let edges = vec![
            DependencyEdge::new("nsubj", "arrested", 2, "Police", 1),
            DependencyEdge::new("dobj", "arrested", 2, "him", 3),
            DependencyEdge::new("conj_and", "arrested", 2, "gave", 5),
            DependencyEdge::new("prt", "gave", 5, "up", 6),
            DependencyEdge::new("dobj", "gave", 5, "search", 8),
            DependencyEdge::new("det", "search", 8, "the", 7),
            DependencyEdge::new("prep_after", "gave", 5, "trial", 11),
            DependencyEdge::new("det", "trial", 11, "the", 10),
        ];
        (tree, edges)
    }

    #[test]
    fn extracts_verbs_with_particles_and_event_nouns() {
        let mut lemmas = LemmaTable::builtin();
        lemmas.insert("arrested", "arrest");
        let nouns = NounEventList::builtin();
        let extractor = EventExtractor::new(ExtractOptions::default(), &lemmas, &nouns);
        let (tree, edges) = sentence();
        let tokens: Vec<_> = extractor
            .extract(0, &tree, &edges)
            .into_iter()
            .map(|e| e.token)
            .collect();
        assert_eq!(tokens, vec!["v-arrest", "v-give_up", "n-trial"]);
    }

    #[test]
    fn surface_mode_keeps_inflection() {
        let lemmas = LemmaTable::builtin();
        let nouns = NounEventList::builtin();
        let options = ExtractOptions {
            filter: TokenFilter::Verbs,
            use_lemmas: false,
            ..ExtractOptions::default()
        };
        let extractor = EventExtractor::new(options, &lemmas, &nouns);
        let (tree, edges) = sentence();
        let events = extractor.extract(3, &tree, &edges);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].token, "v-arrested");
        assert_eq!(events[1].token, "v-gave_up");
        assert!(events[1].is_collocation());
        assert_eq!(events[1].sentence, 3);
        assert_eq!(events[1].position, 5);
    }

    #[test]
    fn base_filter_drops_particles() {
        let lemmas = LemmaTable::builtin();
        let nouns = NounEventList::builtin();
        let options = ExtractOptions {
            filter: TokenFilter::Base,
            ..ExtractOptions::default()
        };
        let extractor = EventExtractor::new(options, &lemmas, &nouns);
        let (tree, edges) = sentence();
        let tokens: Vec<_> = extractor
            .extract(0, &tree, &edges)
            .into_iter()
            .map(|e| e.token)
            .collect();
        assert_eq!(tokens, vec!["v-arrested", "v-give", "n-search", "n-trial"]);
    }

    #[test]
    fn expansion_emits_one_event_per_edge() {
        let lemmas = LemmaTable::builtin();
        let nouns = NounEventList::builtin();
        let options = ExtractOptions {
            filter: TokenFilter::Verbs,
            expand_relations: true,
            ..ExtractOptions::default()
        };
        let extractor = EventExtractor::new(options, &lemmas, &nouns);
        let (tree, edges) = sentence();
        let events = extractor.extract(0, &tree, &edges);
        let arrests = events.iter().filter(|e| e.position == 2).count();
        assert_eq!(arrests, 3);
        assert_eq!(events[0].relation.as_deref(), Some("nsubj"));
    }

    #[test]
    fn numerals_collapse_to_sentinel() {
        let lemmas = LemmaTable::builtin();
        let nouns = NounEventList::builtin();
        let options = ExtractOptions {
            filter: TokenFilter::All,
            ..ExtractOptions::default()
        };
        let extractor = EventExtractor::new(options, &lemmas, &nouns);
        let tree = ParseTree::from_tagged([("CD", "1,200"), ("NNS", "troops")]);
        let edges = vec![DependencyEdge::new("num", "1,200", 1, "troops", 2)];
        let events = extractor.extract(0, &tree, &edges);
        assert_eq!(events[0].token, format!("o-{NUMERAL}"));
    }

    #[test]
    fn pos_prefix_rules() {
        assert_eq!(PosClass::from_tag("VBZ"), PosClass::Verb);
        assert_eq!(PosClass::from_tag("NNPS"), PosClass::Noun);
        assert_eq!(PosClass::from_tag("JJR"), PosClass::Adjective);
        assert_eq!(PosClass::from_tag("PRP$"), PosClass::Pronoun);
        assert_eq!(PosClass::from_tag("IN"), PosClass::Other);
    }
}
