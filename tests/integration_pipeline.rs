#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests from ingestion file through index build to retrieval
// A deterministic word-hashing embedder stands in for the sentence model

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use museum_docent::commands::build_index_with;
use museum_docent::corpus::load_artwork_chunks;
use museum_docent::embeddings::{Embedder, l2_normalize};
use museum_docent::index::{BundlePaths, IndexBundle, IndexCache};
use museum_docent::retrieval::Retriever;
use museum_docent::{DocentError, Result};
use tempfile::TempDir;

const DIMENSION: usize = 256;

struct WordHashEmbedder;

impl Embedder for WordHashEmbedder {
    fn model_name(&self) -> &str {
        "word-hash"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0; DIMENSION];
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    let mut hasher = DefaultHasher::new();
                    word.to_lowercase().hash(&mut hasher);
                    vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
                }
                l2_normalize(&mut vector);
                vector
            })
            .collect())
    }
}

fn write_artworks(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("met_artworks.jsonl");
    fs::write(&path, lines.join("\n")).expect("should write artworks");
    path
}

fn famous_three() -> Vec<&'static str> {
    vec![
        r#"{"title": "The Starry Night", "artist": "Vincent Van Gogh", "date": "1889", "medium": "Oil on canvas"}"#,
        r#"{"title": "The Scream", "artist": "Edvard Munch", "date": "1893"}"#,
        r#"{"title": "Mona Lisa", "artist": "Leonardo da Vinci", "description": "Portrait of Lisa Gherardini"}"#,
    ]
}

fn build(dir: &TempDir, lines: &[&str]) -> PathBuf {
    let data = write_artworks(dir.path(), lines);
    let base = dir.path().join("artwork_index");
    build_index_with(Arc::new(WordHashEmbedder), &data, &base).expect("build should succeed");
    base
}

fn retriever() -> Retriever {
    Retriever::new(Arc::new(WordHashEmbedder), Arc::new(IndexCache::new()))
}

#[test]
fn van_gogh_query_ranks_starry_night_first() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = build(&temp_dir, &famous_three());

    let results = retriever().retrieve_similar_artworks("Van Gogh painting", &base, 3);

    assert_eq!(results.len(), 3);
    assert!(results[0].contains("Van Gogh"));
    assert!(results[0].starts_with("Title: The Starry Night"));
}

#[test]
fn large_top_k_returns_whole_corpus() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = build(&temp_dir, &famous_three());

    let results = retriever().retrieve_similar_artworks("Van Gogh painting", &base, 10);

    assert_eq!(results.len(), 3);
}

#[test]
fn malformed_line_is_skipped_and_build_succeeds() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let data = write_artworks(
        temp_dir.path(),
        &[
            r#"{"title": "Water Lilies", "artist": "Claude Monet"}"#,
            r#"{"title": "broken"#,
            r#"{"title": "The Great Wave", "artist": "Hokusai"}"#,
        ],
    );
    let base = temp_dir.path().join("artwork_index");

    let summary = build_index_with(Arc::new(WordHashEmbedder), &data, &base)
        .expect("build should succeed");
    assert_eq!(summary.chunks, 2);
    assert_eq!(summary.skipped, 1);

    let bundle = IndexBundle::load(&base).expect("bundle should load");
    assert_eq!(bundle.index.len(), 2);
    assert_eq!(bundle.chunks.len(), 2);
    assert!(bundle.chunks[1].contains("Hokusai"));
}

#[test]
fn empty_ingestion_file_fails_without_artifacts() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let data = write_artworks(temp_dir.path(), &[]);
    let base = temp_dir.path().join("artwork_index");

    assert!(build_index_with(Arc::new(WordHashEmbedder), &data, &base).is_err());

    let paths = BundlePaths::new(&base);
    assert!(!paths.index.exists());
    assert!(!paths.chunks.exists());
}

#[test]
fn missing_index_yields_empty_results() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = temp_dir.path().join("never_built");

    assert!(matches!(
        IndexBundle::load(&base),
        Err(DocentError::IndexNotFound(_))
    ));
    assert!(
        retriever()
            .retrieve_similar_artworks("Van Gogh", &base, 3)
            .is_empty()
    );
}

#[test]
fn placeholders_fill_missing_fields() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let data = write_artworks(temp_dir.path(), &[r#"{"description": "A bronze horse"}"#]);

    let corpus = load_artwork_chunks(&data).expect("corpus should load");

    assert_eq!(
        corpus.chunks,
        vec![
            "Title: Unknown Title\nArtist: Unknown Artist\nDate: Unknown Date\n\
             Medium: Unknown Medium\nDimensions: \nDescription: A bronze horse\nSource:"
                .to_string()
        ]
    );
}

#[test]
fn rebuild_replaces_artifacts_but_not_a_live_cache() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = build(&temp_dir, &famous_three());
    let cached = retriever();

    let before = cached.retrieve_similar_artworks("Hokusai wave", &base, 5);
    assert_eq!(before.len(), 3);

    let mut lines = famous_three();
    lines.push(r#"{"title": "The Great Wave", "artist": "Hokusai"}"#);
    let data = write_artworks(temp_dir.path(), &lines);
    build_index_with(Arc::new(WordHashEmbedder), &data, &base).expect("rebuild");

    assert_eq!(
        cached
            .retrieve_similar_artworks("Hokusai wave", &base, 5)
            .len(),
        3
    );

    let fresh = retriever().retrieve_similar_artworks("Hokusai wave", &base, 5);
    assert_eq!(fresh.len(), 4);
    assert!(fresh[0].contains("Hokusai"));
}

#[test]
fn concurrent_queries_share_one_bundle() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let base = build(&temp_dir, &famous_three());
    let shared = Arc::new(retriever());

    let handles: Vec<_> = ["Van Gogh", "Edvard Munch", "Mona Lisa", "Van Gogh"]
        .into_iter()
        .map(|query| {
            let shared = Arc::clone(&shared);
            let base = base.clone();
            thread::spawn(move || shared.retrieve_similar_artworks(query, &base, 1))
        })
        .collect();

    for handle in handles {
        let results = handle.join().expect("query thread should finish");
        assert_eq!(results.len(), 1);
    }
    assert_eq!(shared.cache().len(), 1);
}
