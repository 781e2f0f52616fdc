//! Error types for the retrieval pipeline.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Chunker error.
    #[error("chunker error: {0}")]
    Chunker(#[from] ragline_chunker::ChunkerError),

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] ragline_embeddings::EmbeddingError),

    /// Generation error.
    #[error("generation error: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    /// A chunk id appeared more than once during a build or load.
    #[error("duplicate chunk id: {0}")]
    DuplicateChunk(String),

    /// The index and the corpus store were built from mismatched inputs.
    /// Never auto-repaired: the whole build is suspect.
    #[error("corpus/index desynchronization: {0}")]
    CorpusDesync(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
