#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::bundle::IndexBundle;
use super::flat::FlatIndex;
use crate::embeddings::{Embedder, check_embeddings};
use crate::{DocentError, Result};

/// Embeds chunks and assembles them into a [`FlatIndex`]
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
}

impl IndexBuilder {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every chunk in one batch call and index the vectors in chunk order
    ///
    /// Fails with [`DocentError::EmptyCorpus`] before touching the embedder
    /// when `chunks` is empty.
    #[inline]
    pub fn build(&self, chunks: &[String]) -> Result<FlatIndex> {
        if chunks.is_empty() {
            return Err(DocentError::EmptyCorpus);
        }

        let dimension = self.embedder.dimension();
        info!(
            "Building index from {} chunks with {} ({} dimensions)",
            chunks.len(),
            self.embedder.model_name(),
            dimension
        );
        let started = Instant::now();

        let embeddings = self.embedder.embed_many(chunks)?;
        check_embeddings(&embeddings, chunks.len(), dimension)?;
        let index = FlatIndex::from_embeddings(dimension, &embeddings)?;

        info!(
            "Indexed {} vectors in {:?}",
            index.len(),
            started.elapsed()
        );
        Ok(index)
    }

    /// Build an in-memory bundle that owns `chunks`
    #[inline]
    pub fn build_bundle(&self, chunks: Vec<String>) -> Result<IndexBundle> {
        let index = self.build(&chunks)?;
        Ok(IndexBundle::new(index, chunks))
    }

    /// Build a bundle and persist it under `base`
    ///
    /// Nothing is written unless embedding and indexing succeed.
    #[inline]
    pub fn build_and_persist<P: AsRef<Path>>(
        &self,
        chunks: Vec<String>,
        base: P,
    ) -> Result<IndexBundle> {
        let bundle = self.build_bundle(chunks)?;
        bundle.save(base)?;
        Ok(bundle)
    }
}
