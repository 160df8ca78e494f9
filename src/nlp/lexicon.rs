//! Lightweight table-backed lexical collaborators: lemmatisation and the
//! event-noun predicate. Swap in a WordNet-backed implementation when available.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use once_cell::sync::Lazy;
use tracing::info;

use crate::{config::Settings, error::Result};

/// Maps a surface token and its POS tag to a lemma.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, token: &str, pos_tag: &str) -> Option<String>;
}

/// Decides whether a noun lemma denotes an event ("arrest", "trial").
pub trait NounEvents: Send + Sync {
    fn is_noun_event(&self, lemma: &str) -> bool;
}

static IRREGULAR_VERBS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("was", "be"),
        ("were", "be"),
        ("is", "be"),
        ("are", "be"),
        ("been", "be"),
        ("had", "have"),
        ("has", "have"),
        ("did", "do"),
        ("does", "do"),
        ("done", "do"),
        ("went", "go"),
        ("gone", "go"),
        ("said", "say"),
        ("made", "make"),
        ("took", "take"),
        ("taken", "take"),
        ("gave", "give"),
        ("given", "give"),
        ("found", "find"),
        ("told", "tell"),
        ("came", "come"),
        ("began", "begin"),
        ("begun", "begin"),
        ("fled", "flee"),
        ("fought", "fight"),
        ("caught", "catch"),
        ("brought", "bring"),
        ("held", "hold"),
        ("left", "leave"),
        ("led", "lead"),
        ("met", "meet"),
        ("paid", "pay"),
        ("sent", "send"),
        ("sold", "sell"),
        ("bought", "buy"),
        ("won", "win"),
        ("lost", "lose"),
        ("shot", "shoot"),
        ("struck", "strike"),
        ("stole", "steal"),
        ("stolen", "steal"),
        ("wrote", "write"),
        ("written", "write"),
        ("became", "become"),
        ("kept", "keep"),
        ("ran", "run"),
        ("saw", "see"),
        ("seen", "see"),
        ("knew", "know"),
        ("known", "know"),
        ("thought", "think"),
        ("spoke", "speak"),
        ("spoken", "speak"),
        ("threw", "throw"),
        ("thrown", "throw"),
    ]
});

static EVENT_NOUNS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "arrest",
        "attack",
        "bombing",
        "conviction",
        "election",
        "explosion",
        "hearing",
        "indictment",
        "investigation",
        "invasion",
        "killing",
        "meeting",
        "murder",
        "negotiation",
        "protest",
        "raid",
        "sentencing",
        "strike",
        "trial",
        "verdict",
        "war",
    ]
});

/// Lemma lookup by lowercase surface form.
#[derive(Debug, Clone)]
pub struct LemmaTable {
    entries: HashMap<String, String>,
}

impl LemmaTable {
    /// Table seeded with common irregular verb forms.
    pub fn builtin() -> Self {
        let entries = IRREGULAR_VERBS
            .iter()
            .map(|(surface, lemma)| ((*surface).to_string(), (*lemma).to_string()))
            .collect();
        Self { entries }
    }

    /// Add `surface<TAB>lemma` rows from a file on top of the built-in table.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        for line in text.lines() {
            if let Some((surface, lemma)) = line.split_once('\t') {
                self.insert(surface.trim(), lemma.trim());
            }
        }
        Ok(self)
    }

    pub fn insert(&mut self, surface: &str, lemma: &str) {
        self.entries
            .insert(surface.to_lowercase(), lemma.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lemmatizer for LemmaTable {
    fn lemmatize(&self, token: &str, _pos_tag: &str) -> Option<String> {
        self.entries.get(&token.to_lowercase()).cloned()
    }
}

/// Membership list of event-denoting noun lemmas.
#[derive(Debug, Clone)]
pub struct NounEventList {
    lemmas: HashSet<String>,
}

impl NounEventList {
    pub fn builtin() -> Self {
        Self {
            lemmas: EVENT_NOUNS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add one lemma per line from a file on top of the built-in list.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        self.lemmas.extend(
            text.lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty()),
        );
        Ok(self)
    }
}

impl NounEvents for NounEventList {
    fn is_noun_event(&self, lemma: &str) -> bool {
        self.lemmas.contains(lemma)
    }
}

/// Load the lemma table configured in settings.
pub fn load_lemmatizer(settings: &Settings) -> Result<Arc<dyn Lemmatizer>> {
    let mut table = LemmaTable::builtin();
    if let Some(path) = &settings.lemma_table {
        table = table.with_file(path)?;
        info!(path = %path.display(), entries = table.len(), "loaded lemma table");
    }
    Ok(Arc::new(table) as Arc<dyn Lemmatizer>)
}

/// Load the event-noun list configured in settings.
pub fn load_noun_events(settings: &Settings) -> Result<Arc<dyn NounEvents>> {
    let mut list = NounEventList::builtin();
    if let Some(path) = &settings.noun_events {
        list = list.with_file(path)?;
        info!(path = %path.display(), "loaded event nouns");
    }
    Ok(Arc::new(list) as Arc<dyn NounEvents>)
}
