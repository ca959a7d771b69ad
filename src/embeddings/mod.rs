// Embeddings module
// Text to vector providers: a local ONNX sentence encoder and an Ollama HTTP backend

#[cfg(feature = "onnx")]
pub mod onnx;
pub mod ollama;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::config::{Config, EmbeddingProviderKind};
use crate::{DocentError, Result};

pub use ollama::OllamaEmbedder;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;

/// sentence-transformers model used by the local embedder
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
/// Token budget per input; longer chunks are truncated
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Maps text to fixed-length dense vectors
///
/// Implementations load their model at most once and are shared read-only
/// across threads. The same text embedded twice by the same provider must
/// produce the same vector.
pub trait Embedder: Send + Sync {
    /// Name of the underlying model, for logging
    fn model_name(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Embed `texts`, returning one vector per input in input order
    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_many(&[text.to_string()])?;
        check_embeddings(&embeddings, 1, self.dimension())?;
        embeddings
            .pop()
            .ok_or_else(|| DocentError::Embedding("Provider returned no embedding".to_string()))
    }
}

/// Construct the embedding provider selected in `config`
///
/// Construction is cheap; model loading happens on first use.
#[inline]
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding.provider {
        #[cfg(feature = "onnx")]
        EmbeddingProviderKind::Onnx => Ok(Arc::new(OnnxEmbedder::new(config))),
        #[cfg(not(feature = "onnx"))]
        EmbeddingProviderKind::Onnx => Err(DocentError::Config(
            "the onnx embedding provider requires the `onnx` cargo feature".to_string(),
        )),
        EmbeddingProviderKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(config)?)),
    }
}

/// Verify a provider response: one vector per input, each of the expected length
#[inline]
pub fn check_embeddings(embeddings: &[Vec<f32>], expected: usize, dimension: usize) -> Result<()> {
    if embeddings.len() != expected {
        return Err(DocentError::Embedding(format!(
            "Mismatch between request and response counts: {} vs {}",
            expected,
            embeddings.len()
        )));
    }

    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
        return Err(DocentError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }

    Ok(())
}

/// Scale `vector` to unit length in place; zero vectors are left untouched
#[inline]
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
