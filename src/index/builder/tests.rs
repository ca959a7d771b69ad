use super::*;
use crate::embeddings::test_support::KeywordEmbedder;
use crate::index::bundle::BundlePaths;
use tempfile::TempDir;

fn chunks() -> Vec<String> {
    vec![
        "Title: The Starry Night\nArtist: Vincent van Gogh".to_string(),
        "Title: The Scream\nArtist: Edvard Munch".to_string(),
        "Title: Mona Lisa\nArtist: Leonardo da Vinci".to_string(),
    ]
}

#[test]
fn build_indexes_every_chunk_in_order() {
    let embedder = Arc::new(KeywordEmbedder::new(64));
    let builder = IndexBuilder::new(embedder.clone());

    let index = builder.build(&chunks()).expect("build should succeed");

    assert_eq!(index.len(), 3);
    assert_eq!(index.dimension(), 64);
    let expected = embedder
        .embed(&chunks()[1])
        .expect("embedding should succeed");
    assert_eq!(index.vector(1), Some(expected.as_slice()));
}

#[test]
fn build_uses_a_single_batch_call() {
    let embedder = Arc::new(KeywordEmbedder::new(16));
    let builder = IndexBuilder::new(embedder.clone());

    builder.build(&chunks()).expect("build should succeed");

    assert_eq!(embedder.calls(), 1);
}

#[test]
fn empty_input_is_rejected_before_embedding() {
    let embedder = Arc::new(KeywordEmbedder::new(16));
    let builder = IndexBuilder::new(embedder.clone());

    assert!(matches!(builder.build(&[]), Err(DocentError::EmptyCorpus)));
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn empty_input_writes_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path().join("artworks");
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::new(16)));

    let result = builder.build_and_persist(Vec::new(), &base);

    assert!(matches!(result, Err(DocentError::EmptyCorpus)));
    let paths = BundlePaths::new(&base);
    assert!(!paths.index.exists());
    assert!(!paths.chunks.exists());
}

#[test]
fn provider_failure_writes_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path().join("artworks");
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::failing(16)));

    let result = builder.build_and_persist(chunks(), &base);

    assert!(matches!(result, Err(DocentError::Embedding(_))));
    assert!(!BundlePaths::new(&base).index.exists());
}

#[test]
fn build_and_persist_round_trips_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path().join("artworks");
    let builder = IndexBuilder::new(Arc::new(KeywordEmbedder::new(32)));

    let built = builder
        .build_and_persist(chunks(), &base)
        .expect("build should succeed");
    let loaded = IndexBundle::load(&base).expect("load should succeed");

    assert_eq!(loaded.chunks, chunks());
    assert_eq!(loaded, built);
    assert!(loaded.is_consistent());
}
