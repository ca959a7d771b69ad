use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocentError>;

#[derive(Error, Debug)]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Artwork data file not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("No artwork chunks available to index")]
    EmptyCorpus,

    #[error("Index artifacts not found at base path: {0}")]
    IndexNotFound(PathBuf),

    #[error("Index bundle is inconsistent: {vectors} vectors but {chunks} chunks")]
    MismatchedBundle { vectors: usize, chunks: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid top_k: {0} (must be at least 1)")]
    InvalidTopK(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod prompt;
pub mod retrieval;
