//! Query-time nearest-neighbour lookup over a persisted bundle.
//!
//! A [`Retriever`] pairs one embedding provider with one [`IndexCache`]. Both
//! are shared read-only across threads; nothing here mutates them after
//! construction except the cache filling in on first load.


use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::embeddings::{Embedder, create_embedder};
use crate::index::{IndexBundle, IndexCache};
use crate::{DocentError, Result};

pub const DEFAULT_TOP_K: usize = 3;

/// One retrieved chunk with its position in the ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub rank: usize,
    /// Squared Euclidean distance between query and chunk embeddings
    pub distance: f32,
    pub text: String,
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    cache: Arc<IndexCache>,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<IndexCache>) -> Self {
        Self { embedder, cache }
    }

    /// Retriever with the configured embedding provider and a fresh cache
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(config)?;
        let cache = IndexCache::new().with_strict(config.retrieval.strict_bundle);
        Ok(Self::new(embedder, Arc::new(cache)))
    }

    #[inline]
    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Top `top_k` chunks of the bundle at `index_base`, nearest first
    ///
    /// A bundle that cannot be loaded yields an empty result rather than an
    /// error. Embedding failures are returned to the caller.
    #[inline]
    pub fn retrieve<P: AsRef<Path>>(
        &self,
        query: &str,
        index_base: P,
        top_k: usize,
    ) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, index_base, top_k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`] but keeping rank and distance
    #[inline]
    pub fn retrieve_scored<P: AsRef<Path>>(
        &self,
        query: &str,
        index_base: P,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(DocentError::InvalidTopK(top_k));
        }

        let index_base = index_base.as_ref();
        let bundle = match self.cache.load(index_base) {
            Ok(bundle) => bundle,
            Err(DocentError::IndexNotFound(path)) => {
                warn!(
                    "No index at {}; returning no results (run `museum-docent build`)",
                    path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                error!(
                    "Failed to load index from {}: {}; returning no results",
                    index_base.display(),
                    e
                );
                return Ok(Vec::new());
            }
        };

        self.retrieve_scored_from(query, &bundle, top_k)
    }

    /// Search an already loaded bundle
    #[inline]
    pub fn retrieve_scored_from(
        &self,
        query: &str,
        bundle: &IndexBundle,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(DocentError::InvalidTopK(top_k));
        }

        let query_vector = self.embedder.embed(query)?;
        let neighbors = bundle.index.search(&query_vector, top_k)?;

        let mut dropped = 0;
        let hits: Vec<ScoredChunk> = neighbors
            .into_iter()
            .filter_map(|neighbor| match bundle.chunks.get(neighbor.position) {
                Some(text) => Some((neighbor.distance, text.clone())),
                None => {
                    dropped += 1;
                    None
                }
            })
            .enumerate()
            .map(|(rank, (distance, text))| ScoredChunk {
                rank,
                distance,
                text,
            })
            .collect();

        if dropped > 0 {
            warn!(
                "Dropped {} hit(s) pointing past the {} stored chunks",
                dropped,
                bundle.chunks.len()
            );
        }
        debug!("Retrieved {} chunk(s) for query", hits.len());

        Ok(hits)
    }

    #[inline]
    pub fn retrieve_from(
        &self,
        query: &str,
        bundle: &IndexBundle,
        top_k: usize,
    ) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored_from(query, bundle, top_k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Ranked chunk texts for presentation code that renders an empty
    /// result as "nothing found"
    ///
    /// Every failure, including embedding errors and `top_k == 0`, is logged
    /// and turned into an empty result.
    #[inline]
    pub fn retrieve_similar_artworks<P: AsRef<Path>>(
        &self,
        query: &str,
        index_path: P,
        top_k: usize,
    ) -> Vec<String> {
        match self.retrieve(query, index_path, top_k) {
            Ok(chunks) => chunks,
            Err(e) => {
                error!("Retrieval failed: {}", e);
                Vec::new()
            }
        }
    }
}
