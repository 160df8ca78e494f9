//! Argument binding: attach coreference entities to events through the
//! dependency edges rooted at each event.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    events::{EntityId, Event},
    parse::DependencyEdge,
    relation::{is_bindable, normalize_relation},
};

/// One mention of a coreference entity. Word indices are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub sentence: usize,
    pub entity: EntityId,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub text: String,
}

impl EntityMention {
    pub fn new(sentence: usize, entity: EntityId, start: usize, end: usize) -> Self {
        Self {
            sentence,
            entity,
            start,
            end,
            text: String::new(),
        }
    }

    pub fn covers(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// Coreference clusters as a union-find over mention indices.
///
/// Mentions sharing an entity id start in one set; explicit merges join sets.
/// Every mention resolves to the smallest entity id of its set, so merged
/// clusters never leave stale ids behind.
#[derive(Debug, Clone, Default)]
pub struct CorefClusters {
    mentions: Vec<EntityMention>,
    resolved: Vec<EntityId>,
    by_sentence: HashMap<usize, Vec<usize>>,
}

impl CorefClusters {
    pub fn new(mentions: Vec<EntityMention>) -> Self {
        Self::with_merges(mentions, &[])
    }

    /// Build clusters and apply `(a, b)` entity merges.
    pub fn with_merges(mentions: Vec<EntityMention>, merges: &[(EntityId, EntityId)]) -> Self {
        fn find(parent: &mut [usize], i: usize) -> usize {
            if parent[i] != i {
                parent[i] = find(parent, parent[i]);
            }
            parent[i]
        }

        fn union(parent: &mut [usize], i: usize, j: usize) {
            let pi = find(parent, i);
            let pj = find(parent, j);
            if pi != pj {
                parent[pi] = pj;
            }
        }

        let mut parent: Vec<usize> = (0..mentions.len()).collect();
        let mut first_of: HashMap<EntityId, usize> = HashMap::new();
        for (idx, mention) in mentions.iter().enumerate() {
            match first_of.get(&mention.entity) {
                Some(&first) => union(&mut parent, idx, first),
                None => {
                    first_of.insert(mention.entity, idx);
                }
            }
        }
        for (a, b) in merges {
            if let (Some(&i), Some(&j)) = (first_of.get(a), first_of.get(b)) {
                union(&mut parent, i, j);
            }
        }

        let mut smallest: HashMap<usize, EntityId> = HashMap::new();
        for (idx, mention) in mentions.iter().enumerate() {
            let root = find(&mut parent, idx);
            let entry = smallest.entry(root).or_insert(mention.entity);
            *entry = (*entry).min(mention.entity);
        }
        let resolved = (0..mentions.len())
            .map(|idx| smallest[&find(&mut parent, idx)])
            .collect();

        let mut by_sentence: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, mention) in mentions.iter().enumerate() {
            by_sentence.entry(mention.sentence).or_default().push(idx);
        }

        Self {
            mentions,
            resolved,
            by_sentence,
        }
    }

    /// Resolved entity of the mention at `index`.
    pub fn entity_of(&self, index: usize) -> Option<EntityId> {
        self.resolved.get(index).copied()
    }

    pub fn mention(&self, index: usize) -> Option<&EntityMention> {
        self.mentions.get(index)
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    /// Entity whose mention covers `word` in `sentence` without also covering
    /// `exclude` (the event's own position). Ties between overlapping
    /// mentions go to the smallest resolved entity id.
    pub fn entity_covering(&self, sentence: usize, word: usize, exclude: usize) -> Option<EntityId> {
        self.by_sentence
            .get(&sentence)?
            .iter()
            .filter(|&&idx| {
                let mention = &self.mentions[idx];
                mention.covers(word) && !mention.covers(exclude)
            })
            .map(|&idx| self.resolved[idx])
            .min()
    }
}

/// Binds entity arguments to events via role-bearing dependency edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentBinder {
    full_prep: bool,
}

impl ArgumentBinder {
    pub fn new(full_prep: bool) -> Self {
        Self { full_prep }
    }

    /// Fill `arguments` of every event. `edges[k]` holds sentence `k`.
    ///
    /// The first binding of an entity to an event wins.
    pub fn bind(&self, events: &mut [Event], edges: &[Vec<DependencyEdge>], clusters: &CorefClusters) {
        for event in events.iter_mut() {
            let Some(sentence_edges) = edges.get(event.sentence) else {
                continue;
            };
            for edge in sentence_edges {
                if edge.governor_index != event.position || !is_bindable(&edge.relation) {
                    continue;
                }
                if let Some(only) = &event.relation {
                    if *only != edge.relation {
                        continue;
                    }
                }
                if let Some(entity) =
                    clusters.entity_covering(event.sentence, edge.dependent_index, event.position)
                {
                    event
                        .arguments
                        .entry(entity)
                        .or_insert_with(|| normalize_relation(&edge.relation, self.full_prep));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::events::PosClass;

    #[test]
    fn binds_subject_and_object() {
        let edges = vec![vec![
            DependencyEdge::new("nsubj", "arrested", 2, "Police", 1),
            DependencyEdge::new("dobj", "arrested", 2, "suspect", 4),
            DependencyEdge::new("det", "suspect", 4, "the", 3),
        ]];
        let clusters = CorefClusters::new(vec![
            EntityMention::new(0, 3, 1, 1),
            EntityMention::new(0, 7, 3, 4),
        ]);
        let mut events = vec![Event::new("v-arrest", PosClass::Verb, 0, 2)];
        ArgumentBinder::new(false).bind(&mut events, &edges, &clusters);
        assert_eq!(events[0].arguments.get(&3).map(String::as_str), Some("s"));
        assert_eq!(events[0].arguments.get(&7).map(String::as_str), Some("o"));
    }

    #[test]
    fn skips_mentions_spanning_the_event() {
        // "the [arrest of the suspect]" as one mention
        let edges = vec![vec![DependencyEdge::new("prep_of", "arrest", 2, "suspect", 5)]];
        let clusters = CorefClusters::new(vec![EntityMention::new(0, 1, 1, 5)]);
        let mut events = vec![Event::new("n-arrest", PosClass::Noun, 0, 2)];
        ArgumentBinder::new(true).bind(&mut events, &edges, &clusters);
        assert!(!events[0].has_arguments());
    }

    #[test]
    fn unbindable_relations_are_ignored() {
        let edges = vec![vec![DependencyEdge::new("tmod", "left", 2, "Monday", 3)]];
        let clusters = CorefClusters::new(vec![EntityMention::new(0, 4, 3, 3)]);
        let mut events = vec![Event::new("v-leave", PosClass::Verb, 0, 2)];
        ArgumentBinder::default().bind(&mut events, &edges, &clusters);
        assert!(events[0].arguments.is_empty());
    }

    #[test]
    fn merges_resolve_to_smallest_entity() {
        let clusters = CorefClusters::with_merges(
            vec![
                EntityMention::new(0, 9, 1, 1),
                EntityMention::new(1, 4, 2, 3),
                EntityMention::new(2, 9, 5, 5),
            ],
            &[(9, 4)],
        );
        assert_eq!(clusters.entity_of(0), Some(4));
        assert_eq!(clusters.entity_of(2), Some(4));
        assert_eq!(clusters.entity_covering(2, 5, 1), Some(4));
    }

    #[test]
    fn overlapping_mentions_prefer_smallest_entity() {
        let clusters = CorefClusters::new(vec![
            EntityMention::new(0, 12, 3, 6),
            EntityMention::new(0, 5, 6, 6),
        ]);
        assert_eq!(clusters.entity_covering(0, 6, 1), Some(5));
    }
}
