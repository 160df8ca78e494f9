//! Pointwise mutual information with a sparse-data discount.

use tracing::info;

use crate::data::{
    counts::{CountStore, CountValue},
    idf::IdfMap,
};

/// Additive constant of the discount `min(f1, f2) / (min(f1, f2) + 10)`.
pub const DISCOUNT_CONSTANT: f64 = 10.0;

/// `ln( P(a,b) / (P(a) P(b)) )` from raw counts.
pub fn pmi(pair_count: f64, total_pairs: f64, freq1: f64, freq2: f64, total_corpus: f64) -> f64 {
    let joint = pair_count / total_pairs;
    let independent = (freq1 / total_corpus) * (freq2 / total_corpus);
    (joint / independent).ln()
}

/// Shrinks PMI for pairs involving rare tokens.
pub fn discount(freq1: f64, freq2: f64) -> f64 {
    let least = freq1.min(freq2);
    least / (least + DISCOUNT_CONSTANT)
}

/// Discounted PMI.
pub fn discounted_pmi(
    pair_count: f64,
    total_pairs: f64,
    freq1: f64,
    freq2: f64,
    total_corpus: f64,
) -> f64 {
    pmi(pair_count, total_pairs, freq1, freq2, total_corpus) * discount(freq1, freq2)
}

/// Converts aggregate pair counts and token frequencies into association scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssociationScorer {
    /// Pairs must have a count strictly above this.
    pub min_pair_count: f64,
    /// Both tokens must have a document frequency strictly above this.
    pub doc_cutoff: u64,
    pub discount: bool,
}

impl Default for AssociationScorer {
    fn default() -> Self {
        Self {
            min_pair_count: 1.0,
            doc_cutoff: 10,
            discount: true,
        }
    }
}

impl AssociationScorer {
    pub fn new(min_pair_count: f64, doc_cutoff: u64) -> Self {
        Self {
            min_pair_count,
            doc_cutoff,
            ..Self::default()
        }
    }

    /// Score a single pair, or `None` when it fails a cutoff or lacks counts.
    pub fn score<V: CountValue>(
        &self,
        counts: &CountStore<V>,
        idf: &IdfMap,
        a: &str,
        b: &str,
    ) -> Option<f64> {
        let total_pairs = counts.total().as_f64();
        let total_corpus = idf.total_term_frequency() as f64;
        self.score_with_totals(counts.get(a, b).as_f64(), total_pairs, total_corpus, idf, a, b)
    }

    fn score_with_totals(
        &self,
        pair_count: f64,
        total_pairs: f64,
        total_corpus: f64,
        idf: &IdfMap,
        a: &str,
        b: &str,
    ) -> Option<f64> {
        if pair_count <= self.min_pair_count
            || idf.doc_frequency(a) <= self.doc_cutoff
            || idf.doc_frequency(b) <= self.doc_cutoff
        {
            return None;
        }
        let freq1 = idf.term_frequency(a) as f64;
        let freq2 = idf.term_frequency(b) as f64;
        if freq1 <= 0.0 || freq2 <= 0.0 || total_pairs <= 0.0 || total_corpus <= 0.0 {
            return None;
        }
        let score = if self.discount {
            discounted_pmi(pair_count, total_pairs, freq1, freq2, total_corpus)
        } else {
            pmi(pair_count, total_pairs, freq1, freq2, total_corpus)
        };
        score.is_finite().then_some(score)
    }

    /// Scores for every qualifying pair; failing pairs are simply absent.
    pub fn score_all<V: CountValue>(&self, counts: &CountStore<V>, idf: &IdfMap) -> CountStore<f64> {
        let total_pairs = counts.total().as_f64();
        let total_corpus = idf.total_term_frequency() as f64;
        let mut scores = CountStore::new();
        scores.set_num_docs(counts.num_docs());
        for (a, b, count) in counts.iter() {
            if let Some(score) =
                self.score_with_totals(count.as_f64(), total_pairs, total_corpus, idf, a, b)
            {
                scores.set(a, b, score);
            }
        }
        info!(
            candidates = counts.len(),
            scored = scores.len(),
            "computed association scores"
        );
        scores
    }
}

/// Strongest associates of `token`, descending.
pub fn top_associates(scores: &CountStore<f64>, token: &str, k: usize) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = scores.reconstruct_vector(token).into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_computed_pmi() {
        let expected = (1e-6f64 / (0.05 * 0.05)).ln();
        let raw = pmi(1.0, 1_000_000.0, 100_000.0, 100_000.0, 2_000_000.0);
        assert!((raw - expected).abs() < 1e-9);
        let factor = discount(100_000.0, 100_000.0);
        assert!((factor - 100_000.0 / 100_010.0).abs() < 1e-12);
        assert!((factor - 0.9999).abs() < 1e-4);
        let discounted = discounted_pmi(1.0, 1_000_000.0, 100_000.0, 100_000.0, 2_000_000.0);
        assert!((discounted - expected * factor).abs() < 1e-9);
    }

    fn fixture() -> (CountStore<u64>, IdfMap) {
        let mut idf = IdfMap::new();
        for doc in 0..30 {
            let mut tokens = vec!["v-arrest", "v-charge"];
            if doc % 2 == 0 {
                tokens.push("v-say");
            }
            if doc < 3 {
                tokens.push("v-rare");
            }
            idf.count_document(tokens);
        }
        idf.calculate_idf();
        let mut counts = CountStore::new();
        counts.increment("v-arrest", "v-charge", 12);
        counts.increment("v-arrest", "v-say", 1);
        counts.increment("v-charge", "v-say", 4);
        counts.increment("v-charge", "v-rare", 9);
        (counts, idf)
    }

    #[test]
    fn cutoffs_leave_pairs_absent() {
        let (counts, idf) = fixture();
        let scores = AssociationScorer::new(1.0, 10).score_all(&counts, &idf);
        assert!(scores.contains("v-arrest", "v-charge"));
        assert!(scores.contains("v-charge", "v-say"));
        // count not above the cutoff
        assert!(!scores.contains("v-arrest", "v-say"));
        // v-rare has a doc frequency of 3
        assert!(!scores.contains("v-charge", "v-rare"));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn score_all_matches_single_pair_scoring() {
        let (counts, idf) = fixture();
        let scorer = AssociationScorer::default();
        let scores = scorer.score_all(&counts, &idf);
        let single = scorer.score(&counts, &idf, "v-charge", "v-arrest").unwrap();
        assert_eq!(scores.get("v-arrest", "v-charge"), single);
        // 12/26 over (30/78 * 30/78), discounted by 30/40
        let expected = ((12.0 / 26.0) / ((30.0f64 / 78.0) * (30.0 / 78.0))).ln() * 0.75;
        assert!((single - expected).abs() < 1e-12);
    }

    #[test]
    fn ranks_associates() {
        let mut scores = CountStore::new();
        scores.set("v-arrest", "v-charge", 2.5);
        scores.set("v-arrest", "v-flee", -0.5);
        scores.set("v-a", "v-arrest", 1.0);
        let top = top_associates(&scores, "v-arrest", 2);
        assert_eq!(top, vec![("v-charge".to_string(), 2.5), ("v-a".to_string(), 1.0)]);
    }
}
