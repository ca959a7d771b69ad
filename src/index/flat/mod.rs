//! Brute-force L2 index.
//!
//! Vectors are stored row-major in one contiguous buffer; position `i` in the
//! index is the `i`-th vector added. There is no removal or update.


use serde::{Deserialize, Serialize};

use crate::{DocentError, Result};

/// Exact k-nearest-neighbour index under squared Euclidean distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

/// A search hit: insertion position of the stored vector and its distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

impl FlatIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Build an index from `embeddings`, keeping their order
    #[inline]
    pub fn from_embeddings(dimension: usize, embeddings: &[Vec<f32>]) -> Result<Self> {
        let mut index = Self {
            dimension,
            vectors: Vec::with_capacity(dimension * embeddings.len()),
        };
        for embedding in embeddings {
            index.add(embedding)?;
        }
        Ok(index)
    }

    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(DocentError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors
    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.vectors.get(start..end)
    }

    /// The `k` stored vectors closest to `query`, nearest first
    ///
    /// Returns `min(k, len)` neighbours. Equal distances keep insertion order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(DocentError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Check the invariants a deserialized index must satisfy
    pub(crate) fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(DocentError::Serialization(
                "index dimension must be non-zero".to_string(),
            ));
        }
        if self.vectors.len() % self.dimension != 0 {
            return Err(DocentError::Serialization(format!(
                "index buffer of {} values is not a multiple of dimension {}",
                self.vectors.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

/// Squared Euclidean distance between two equally sized vectors
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
