//! Error types for the chunker.

use thiserror::Error;

/// Result type alias for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while chunking documents.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Chunk size must be positive.
    #[error("invalid chunk size: {chunk_size} (must be > 0)")]
    InvalidChunkSize { chunk_size: usize },

    /// Overlap must be strictly smaller than the chunk size.
    #[error("invalid overlap: {overlap} (must be < chunk size {chunk_size})")]
    InvalidOverlap { overlap: usize, chunk_size: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
