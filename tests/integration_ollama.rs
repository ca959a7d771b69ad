#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Index build and retrieval through the Ollama embedding backend
// The mocked tests always run; the live ones need a local Ollama instance:
//   cargo test --test integration_ollama -- --ignored

use serde_json::{Value, json};
use serial_test::serial;
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use museum_docent::commands::build_index_with;
use museum_docent::config::{Config, EmbeddingProviderKind, OllamaConfig};
use museum_docent::embeddings::{Embedder, OllamaEmbedder, create_embedder};
use museum_docent::index::IndexCache;
use museum_docent::retrieval::Retriever;

const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;
const LIVE_MODEL: &str = "all-minilm:latest";

/// Answers `/api/embed` with a vector keyed on which artist a text mentions
struct ArtistResponder;

const ARTISTS: [&str; 3] = ["gogh", "munch", "vinci"];

impl Respond for ArtistResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let embeddings: Vec<Vec<f32>> = body["input"]
            .as_array()
            .map(|inputs| {
                inputs
                    .iter()
                    .map(|input| {
                        let text = input.as_str().unwrap_or_default().to_lowercase();
                        ARTISTS
                            .iter()
                            .map(|artist| if text.contains(artist) { 1.0 } else { 0.0 })
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResponseTemplate::new(200).set_body_json(json!({ "embeddings": embeddings }))
    }
}

async fn mock_ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "all-minilm:latest"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ArtistResponder)
        .mount(&server)
        .await;
    server
}

fn mock_config(server: &MockServer) -> Config {
    let address = server.address();
    let mut config = Config {
        ollama: OllamaConfig {
            host: address.ip().to_string(),
            port: address.port(),
            model: "all-minilm".to_string(),
            batch_size: 2,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };
    config.embedding.provider = EmbeddingProviderKind::Ollama;
    config.embedding.dimension = ARTISTS.len();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn build_and_retrieve_through_mocked_ollama() {
    let server = mock_ollama().await;
    let config = mock_config(&server);
    let temp_dir = TempDir::new().expect("should create temp dir");
    let data = temp_dir.path().join("met_artworks.jsonl");
    fs::write(
        &data,
        [
            r#"{"title": "The Starry Night", "artist": "Vincent van Gogh"}"#,
            r#"{"title": "The Scream", "artist": "Edvard Munch"}"#,
            r#"{"title": "Mona Lisa", "artist": "Leonardo da Vinci"}"#,
        ]
        .join("\n"),
    )
    .expect("should write data");
    let base = temp_dir.path().join("artwork_index");

    let results = tokio::task::spawn_blocking(move || {
        let embedder = create_embedder(&config).expect("should create embedder");
        build_index_with(Arc::clone(&embedder), &data, &base).expect("build should succeed");

        let retriever = Retriever::new(embedder, Arc::new(IndexCache::new()));
        retriever
            .retrieve("Edvard Munch", &base, 2)
            .expect("retrieval should succeed")
    })
    .await
    .expect("task should join");

    assert_eq!(results.len(), 2);
    assert!(results[0].contains("The Scream"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_ollama_fails_the_build() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let config = mock_config(&server);
    let temp_dir = TempDir::new().expect("should create temp dir");
    let data = temp_dir.path().join("met_artworks.jsonl");
    fs::write(&data, r#"{"title": "The Scream"}"#).expect("should write data");
    let base = temp_dir.path().join("artwork_index");

    let (result, index_written) = tokio::task::spawn_blocking(move || {
        let embedder = OllamaEmbedder::new(&config)
            .expect("should create embedder")
            .with_retry_attempts(2)
            .with_backoff(Duration::from_millis(1));
        let result = build_index_with(Arc::new(embedder), &data, &base);
        (result, base.with_extension("index").exists())
    })
    .await
    .expect("task should join");

    assert!(result.is_err());
    assert!(!index_written);
}

fn live_config() -> Config {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| LIVE_MODEL.to_string());

    let mut config = Config {
        ollama: OllamaConfig {
            host,
            port,
            model,
            batch_size: 5,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };
    config.embedding.provider = EmbeddingProviderKind::Ollama;
    config
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[serial]
#[ignore = "requires a local Ollama instance"]
fn live_health_check() {
    init_test_tracing();

    let embedder = OllamaEmbedder::new(&live_config())
        .expect("should create embedder")
        .with_timeout(Duration::from_secs(60));

    let result = embedder.health_check();
    assert!(result.is_ok(), "health check failed: {:?}", result);
}

#[test]
#[serial]
#[ignore = "requires a local Ollama instance"]
fn live_embeddings_match_configured_dimension() {
    init_test_tracing();

    let config = live_config();
    let embedder = OllamaEmbedder::new(&config)
        .expect("should create embedder")
        .with_timeout(Duration::from_secs(60));

    let texts = vec![
        "Title: The Starry Night\nArtist: Vincent van Gogh".to_string(),
        "Title: The Scream\nArtist: Edvard Munch".to_string(),
    ];
    let embeddings = embedder.embed_many(&texts).expect("embedding should succeed");

    assert_eq!(embeddings.len(), 2);
    assert!(
        embeddings
            .iter()
            .all(|e| e.len() == config.embedding.dimension)
    );

    let again = embedder.embed(&texts[0]).expect("embedding should succeed");
    let drift: f32 = again
        .iter()
        .zip(&embeddings[0])
        .map(|(a, b)| (a - b).abs())
        .sum();
    assert!(drift < 1e-3, "repeated embedding drifted by {}", drift);
}
