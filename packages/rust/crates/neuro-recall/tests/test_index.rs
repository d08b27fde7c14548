//! ExampleIndex tests.

use std::collections::BTreeSet;

use neuro_recall::{
    ExampleCorpus, ExampleIndex, HashEncoder, RecallError, ReferenceExample, SearchOptions,
    blend_score,
};
use neuro_types::ToolCall;

fn corpus() -> ExampleCorpus {
    ExampleCorpus::from_examples(vec![
        ReferenceExample::new(
            "load-1",
            "load the recording subject01.edf",
            ToolCall::new("load_data").with_param("path", "subject01.edf"),
            "data",
        ),
        ReferenceExample::new(
            "filter-1",
            "bandpass filter the signal from 1 to 40 hz",
            ToolCall::new("apply_filter")
                .with_param("low", 1)
                .with_param("high", 40),
            "preprocessing",
        ),
        ReferenceExample::new(
            "notch-1",
            "remove 50 hz line noise with a notch filter",
            ToolCall::new("apply_notch").with_param("freq", 50),
            "preprocessing",
        ),
        ReferenceExample::new(
            "train-1",
            "train the model for 20 epochs",
            ToolCall::new("run_training").with_param("epochs", 20),
            "training",
        ),
    ])
    .unwrap()
}

fn search(index: &ExampleIndex, encoder: &HashEncoder, query: &str, options: &SearchOptions) -> Vec<String> {
    index
        .search(&encoder.encode(query), query, options)
        .unwrap()
        .into_iter()
        .map(|hit| hit.example_id)
        .collect()
}

#[test]
fn test_semantic_search_ranks_shared_vocabulary_first() {
    let encoder = HashEncoder::new(512);
    let index = ExampleIndex::build(corpus(), &encoder);
    let hits = search(&index, &encoder, "bandpass filter 4 to 40 hz", &SearchOptions::default());
    assert_eq!(hits.first().map(String::as_str), Some("filter-1"));
    assert!(hits.len() <= 3);
}

#[test]
fn test_category_filter_excludes_other_tools() {
    let encoder = HashEncoder::new(512);
    let index = ExampleIndex::build(corpus(), &encoder);
    let options = SearchOptions {
        top_k: 10,
        categories: Some(BTreeSet::from(["data".to_string()])),
        min_score: -1.0,
        ..SearchOptions::default()
    };
    let hits = search(&index, &encoder, "bandpass filter 4 to 40 hz", &options);
    assert_eq!(hits, vec!["load-1".to_string()]);
}

#[test]
fn test_top_k_and_min_score_bound_results() {
    let encoder = HashEncoder::new(512);
    let index = ExampleIndex::build(corpus(), &encoder);
    let options = SearchOptions {
        top_k: 1,
        ..SearchOptions::default()
    };
    assert_eq!(search(&index, &encoder, "notch filter 50 hz", &options).len(), 1);

    let strict = SearchOptions {
        top_k: 10,
        min_score: 1.5,
        ..SearchOptions::default()
    };
    assert!(search(&index, &encoder, "notch filter 50 hz", &strict).is_empty());
}

#[test]
fn test_hybrid_weight_one_is_pure_keyword_overlap() {
    let encoder = HashEncoder::new(512);
    let index = ExampleIndex::build(corpus(), &encoder);
    let options = SearchOptions {
        top_k: 4,
        hybrid_weight: Some(1.0),
        min_score: -1.0,
        ..SearchOptions::default()
    };
    let hits = index
        .search(&encoder.encode("train epochs"), "train epochs", &options)
        .unwrap();
    assert_eq!(hits[0].example_id, "train-1");
    assert!((hits[0].similarity_score - 1.0).abs() < 1e-6);
    assert!(hits[1..].iter().all(|hit| hit.similarity_score.abs() < 1e-6));
    // Equal scores fall back to id order.
    let tail: Vec<_> = hits[1..].iter().map(|hit| hit.example_id.as_str()).collect();
    assert_eq!(tail, vec!["filter-1", "load-1", "notch-1"]);
}

#[test]
fn test_blend_score_clamps_weight() {
    assert!((blend_score(0.8, 0.2, None) - 0.8).abs() < 1e-6);
    assert!((blend_score(0.8, 0.2, Some(0.5)) - 0.5).abs() < 1e-6);
    assert!((blend_score(0.8, 0.2, Some(7.0)) - 0.2).abs() < 1e-6);
}

#[test]
fn test_query_dimension_mismatch_is_an_error() {
    let index = ExampleIndex::build(corpus(), &HashEncoder::new(64));
    let err = index
        .search(&[0.0; 8], "anything", &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RecallError::DimensionMismatch {
            expected: 64,
            actual: 8
        }
    ));
}

#[test]
fn test_external_embeddings_must_match_corpus() {
    let err = ExampleIndex::from_embeddings(corpus(), vec![vec![1.0, 0.0]]).unwrap_err();
    assert!(matches!(err, RecallError::EmbeddingCount { expected: 4, actual: 1 }));

    let index = ExampleIndex::from_embeddings(
        corpus(),
        vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.7, 0.7],
            vec![-1.0, 0.0],
        ],
    )
    .unwrap();
    let hits = index
        .search(&[0.0, 1.0], "", &SearchOptions::default())
        .unwrap();
    assert_eq!(hits[0].example_id, "filter-1");
    assert_eq!(hits[0].reference_tool_call.tool_name, "apply_filter");
}

#[test]
fn test_empty_index_returns_nothing() {
    let index = ExampleIndex::default();
    assert!(index
        .search(&[1.0], "filter", &SearchOptions::default())
        .unwrap()
        .is_empty());
}
