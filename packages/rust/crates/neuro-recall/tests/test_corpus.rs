//! Corpus loading and encoder tests.

use std::io::Write;

use neuro_recall::{ExampleCorpus, HashEncoder, RecallError, cosine_similarity};

#[test]
fn test_load_wrapped_and_bare_corpus_files() {
    let wrapped = r#"{"examples": [
        {"id": "a", "instruction": "load subject01", "category": "data",
         "tool_call": {"name": "load_data", "parameters": {"path": "subject01.edf"}}}
    ]}"#;
    let bare = r#"[
        {"id": "b", "instruction": "show status", "category": "info",
         "tool_call": {"name": "get_status"}}
    ]"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(wrapped.as_bytes()).unwrap();
    let corpus = ExampleCorpus::load(file.path()).unwrap();
    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.examples()[0].tool_call.param_str("path"), Some("subject01.edf"));

    let corpus = ExampleCorpus::from_json_str(bare).unwrap();
    assert!(corpus.examples()[0].tool_call.parameters.is_empty());
    assert!(corpus.categories().contains("info"));
}

#[test]
fn test_duplicate_ids_and_empty_instructions_are_rejected() {
    let dup = r#"[
        {"id": "a", "instruction": "x", "category": "c", "tool_call": {"name": "t"}},
        {"id": "a", "instruction": "y", "category": "c", "tool_call": {"name": "t"}}
    ]"#;
    assert!(matches!(
        ExampleCorpus::from_json_str(dup),
        Err(RecallError::InvalidExample { .. })
    ));
    let blank = r#"[{"id": "a", "instruction": "  ", "category": "c", "tool_call": {"name": "t"}}]"#;
    assert!(ExampleCorpus::from_json_str(blank).is_err());
}

#[test]
fn test_missing_file_and_bad_json() {
    let err = ExampleCorpus::load(std::path::Path::new("/nonexistent/corpus.json")).unwrap_err();
    assert!(matches!(err, RecallError::Io { .. }));
    assert!(matches!(
        ExampleCorpus::from_json_str("{not json"),
        Err(RecallError::Parse(_))
    ));
}

#[test]
fn test_encoder_is_deterministic_and_normalized() {
    let encoder = HashEncoder::new(128);
    let a = encoder.encode("apply a bandpass filter");
    let b = encoder.encode("apply a bandpass filter");
    assert_eq!(a, b);
    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    assert!(encoder.encode("the of a").iter().all(|x| *x == 0.0));
}

#[test]
fn test_cosine_similarity_edge_cases() {
    assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).abs() < f32::EPSILON);
    assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}
