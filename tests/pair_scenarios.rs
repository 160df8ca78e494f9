use std::{path::Path, sync::Arc};

use event_assoc::{
    config::Settings,
    data::idf::{IdfMap, Informativeness},
    nlp::{
        events::{Event, ExtractOptions, PosClass},
        lexicon::{LemmaTable, NounEventList},
        EventPipeline,
    },
    signals::{
        self,
        pairs::{CounterOptions, PairCounter},
        CountJob,
    },
};
use serde_json::json;

fn verb(token: &str, sentence: usize, position: usize) -> Event {
    Event::new(token, PosClass::Verb, sentence, position)
}

fn permissive<V: event_assoc::data::counts::CountValue>() -> CounterOptions<V> {
    CounterOptions {
        gate: Informativeness::permissive(),
        ..CounterOptions::default()
    }
}

#[test]
fn shared_entity_records_role_pattern() {
    let mut counter = PairCounter::<u64>::new(permissive(), Arc::new(IdfMap::new())).unwrap();
    let events = vec![
        verb("v-arrest", 0, 2).with_argument(7, "s"),
        verb("v-charge", 0, 6).with_argument(7, "o"),
    ];
    counter.process_document("doc1", &events);
    let counts = counter.finish();
    assert_eq!(counts.get("v-arrest", "v-charge"), 1);
    assert_eq!(counts.patterns.get("v-arrest", "v-charge")["s:o"], 1);
    assert_eq!(counts.patterns.get("v-charge", "v-arrest")["o:s"], 1);
}

#[test]
fn recurring_pair_counts_once_per_document() {
    let mut counter = PairCounter::<u64>::new(permissive(), Arc::new(IdfMap::new())).unwrap();
    let events = vec![
        verb("v-arrest", 0, 2).with_argument(7, "s"),
        verb("v-charge", 1, 3).with_argument(7, "o"),
    ];
    counter.process_document("doc1", &events);
    counter.process_document("doc2", &events);
    assert_eq!(counter.counts().get("v-charge", "v-arrest"), 2);
}

#[test]
fn rare_tokens_never_pair() {
    let mut idf = IdfMap::new();
    for doc in 0..100 {
        let mut tokens = vec!["v-arrest", "v-charge"];
        if doc % 3 == 0 {
            tokens.clear();
            tokens.push("v-say");
        }
        if doc < 5 {
            tokens.push("v-extradite");
        }
        idf.count_document(tokens);
    }
    idf.calculate_idf();
    assert_eq!(idf.doc_frequency("v-extradite"), 5);

    let options = CounterOptions {
        gate: Informativeness::new(10, 0.1),
        ..CounterOptions::default()
    };
    let mut counter = PairCounter::<u64>::new(options, Arc::new(idf)).unwrap();
    let events = vec![
        verb("v-extradite", 0, 1).with_argument(1, "o"),
        verb("v-arrest", 0, 4).with_argument(1, "o"),
        verb("v-charge", 1, 2).with_argument(1, "o"),
        verb("v-extradite", 2, 2).with_argument(1, "o"),
    ];
    counter.process_document("doc", &events);
    let counts = counter.finish();
    assert_eq!(counts.get("v-arrest", "v-charge"), 1);
    assert_eq!(counts.get("v-extradite", "v-arrest"), 0);
    assert_eq!(counts.get("v-charge", "v-extradite"), 0);
}

fn write_partition(path: &Path, id: &str) {
    write_story(path, id, ("fled", "caught"));
}

/// "Smith <first>. Police <second> him." with Smith and him coreferent.
fn write_story(path: &Path, id: &str, (first, second): (&str, &str)) {
    let doc = json!({
        "id": id,
        "parses": [
            format!("(ROOT (S (NP (NNP Smith)) (VP (VBD {first}))))"),
            format!("(ROOT (S (NP (NNS Police)) (VP (VBD {second}) (NP (PRP him)))))")
        ],
        "deps": [
            [format!("nsubj({first}-2, Smith-1)")],
            [format!("nsubj({second}-2, Police-1)"), format!("dobj({second}-2, him-3)")]
        ],
        "entities": [
            {"sentence": 0, "entity": 7, "start": 1, "end": 1, "text": "Smith"},
            {"sentence": 1, "entity": 7, "start": 3, "end": 3, "text": "him"}
        ]
    });
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, format!("{doc}\nnot json\n")).unwrap();
}

fn pipeline() -> EventPipeline {
    EventPipeline::new(
        ExtractOptions::default(),
        Arc::new(LemmaTable::builtin()),
        Arc::new(NounEventList::builtin()),
    )
}

#[tokio::test]
async fn corpus_counts_merge_across_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    std::fs::create_dir_all(&corpus).unwrap();
    write_partition(&corpus.join("a.jsonl"), "a-1");
    write_partition(&corpus.join("b.jsonl"), "b-1");

    let settings = Settings::default();
    let pipeline = pipeline();
    let idf_path = dir.path().join("idf.tsv");
    let idf = signals::build_idf(&settings, pipeline.clone(), &corpus, &idf_path)
        .await
        .unwrap();
    assert_eq!(idf.num_docs(), 2);
    assert_eq!(idf.doc_frequency("v-flee"), 2);

    let output = dir.path().join("out").join("pairs.counts");
    let job = CountJob {
        corpus,
        idf: idf_path,
        output: output.clone(),
        options: permissive::<u64>(),
        resume: false,
    };
    let counts = signals::count_pairs(&settings, pipeline, job).await.unwrap();
    assert!(output.exists());
    assert!(dir.path().join("out/partitions/a.counts").exists());

    let pairs: serde_json::Map<String, serde_json::Value> = counts
        .pairs
        .iter()
        .map(|(a, b, n)| (format!("{a}+{b}"), json!(n)))
        .collect();
    insta::assert_json_snapshot!(json!({
        "docs": counts.pairs.num_docs(),
        "pairs": pairs,
        "roles": counts.patterns.get("v-catch", "v-flee"),
    }), @r###"
    {
      "docs": 2,
      "pairs": {
        "v-catch+v-flee": 2
      },
      "roles": {
        "o:s": 2
      }
    }
    "###);
}

#[tokio::test]
async fn resume_keeps_same_named_partitions_apart() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    write_story(&corpus.join("1994").join("part.jsonl"), "1994-1", ("fled", "caught"));
    write_story(&corpus.join("1995").join("part.jsonl"), "1995-1", ("left", "shot"));

    let settings = Settings::default();
    let idf_path = dir.path().join("idf.tsv");
    signals::build_idf(&settings, pipeline(), &corpus, &idf_path)
        .await
        .unwrap();

    let output = dir.path().join("out").join("pairs.counts");
    let job = |resume| CountJob {
        corpus: corpus.clone(),
        idf: idf_path.clone(),
        output: output.clone(),
        options: CounterOptions {
            links: true,
            ..permissive::<u64>()
        },
        resume,
    };
    let fresh = signals::count_pairs(&settings, pipeline(), job(false))
        .await
        .unwrap();
    assert_eq!(fresh.get("v-catch", "v-flee"), 1);
    assert_eq!(fresh.get("v-leave", "v-shoot"), 1);
    let partitions = dir.path().join("out").join("partitions");
    assert!(partitions.join("1994__part.counts").exists());
    assert!(partitions.join("1995__part.counts").exists());

    // Resumed partitions come from their checkpoints, not the corpus.
    std::fs::write(corpus.join("1994").join("part.jsonl"), "").unwrap();
    let resumed = signals::count_pairs(&settings, pipeline(), job(true))
        .await
        .unwrap();
    assert_eq!(resumed.get("v-catch", "v-flee"), 1);
    assert_eq!(resumed.get("v-leave", "v-shoot"), 1);
    assert_eq!(resumed.pairs.num_docs(), 2);
    assert_eq!(resumed.patterns, fresh.patterns);
    assert_eq!(resumed.patterns.get("v-leave", "v-shoot")["s:o"], 1);
    assert_eq!(resumed.links.len(), 2);
}
