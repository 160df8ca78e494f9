//! Text layer: decoding parsed sentences into events with bound arguments.

pub mod binder;
pub mod events;
pub mod lexicon;
pub mod parse;
pub mod relation;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{config::Settings, data::corpus::RawDocument, error::Result};

use self::{
    binder::{ArgumentBinder, CorefClusters},
    events::{Event, EventExtractor, ExtractOptions},
    lexicon::{Lemmatizer, NounEvents},
    parse::{parse_dependencies, ParseTree},
};

/// Extraction plus binding for whole documents.
#[derive(Clone)]
pub struct EventPipeline {
    options: ExtractOptions,
    lemmatizer: Arc<dyn Lemmatizer>,
    nouns: Arc<dyn NounEvents>,
}

impl EventPipeline {
    pub fn new(
        options: ExtractOptions,
        lemmatizer: Arc<dyn Lemmatizer>,
        nouns: Arc<dyn NounEvents>,
    ) -> Self {
        Self {
            options,
            lemmatizer,
            nouns,
        }
    }

    /// Pipeline with the collaborators configured in settings.
    pub fn from_settings(settings: &Settings, options: ExtractOptions) -> Result<Self> {
        Ok(Self::new(
            options,
            lexicon::load_lemmatizer(settings)?,
            lexicon::load_noun_events(settings)?,
        ))
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Events of one document in sentence order, then word order.
    ///
    /// A parse/dependency count mismatch rejects the document; a sentence
    /// with an undecodable tree or dependency line is skipped on its own.
    pub fn process(&self, doc: &RawDocument) -> Result<Vec<Event>> {
        doc.check_shape()?;
        let extractor = EventExtractor::new(self.options, self.lemmatizer.as_ref(), self.nouns.as_ref());

        let mut events = Vec::new();
        let mut edges = Vec::with_capacity(doc.deps.len());
        for (sentence, (parse, deps)) in doc.parses.iter().zip(&doc.deps).enumerate() {
            let decoded = ParseTree::parse(parse).and_then(|tree| Ok((tree, parse_dependencies(deps)?)));
            match decoded {
                Ok((tree, sentence_edges)) => {
                    events.extend(extractor.extract(sentence, &tree, &sentence_edges));
                    edges.push(sentence_edges);
                }
                Err(err) => {
                    warn!(doc = %doc.id, sentence, %err, "skipping malformed sentence");
                    edges.push(Vec::new());
                }
            }
        }

        let clusters = CorefClusters::with_merges(doc.entities.clone(), &doc.merges);
        ArgumentBinder::new(self.options.full_prep).bind(&mut events, &edges, &clusters);
        debug!(doc = %doc.id, events = events.len(), mentions = clusters.len(), "extracted events");
        Ok(events)
    }
}
