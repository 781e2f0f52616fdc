//! # Retrieval
//!
//! The retrieval pipeline: corpus ingestion, exact vector search, and
//! context assembly for answer generation.
//!
//! ## Data flow
//!
//! ```text
//! raw text ──► Chunker ──► CorpusStore ──► EmbeddingProvider
//!                                               │
//!                                               ▼
//!                        Retriever ◄──── VectorIndex (built once)
//!                            │
//!                            ▼
//!                    ContextAssembler ──► GenerationProvider
//! ```
//!
//! Ingestion is a batch run that rebuilds everything from scratch; the
//! resulting index and stores are immutable, so query-time retrieval is safe
//! for unlimited concurrent readers without locking.

pub mod assemble;
pub mod config;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod retriever;
pub mod store;

pub use assemble::{CONTEXT_DELIMITER, ContextAssembler, FALLBACK_ANSWER};
pub use config::RetrievalConfig;
pub use error::{Result, RetrievalError};
pub use generation::{GenerationError, GenerationProvider, OpenRouterProvider};
pub use pipeline::{EXPORT_FILE, IngestOutput, IngestPipeline, IngestStats};
pub use retriever::{RetrievalResult, Retriever};
pub use store::{ChunkRef, CorpusStore, ExportRecord};

// Re-export from dependencies for convenience
pub use ragline_chunker::{Chunk, Chunker, ChunkerConfig};
pub use ragline_embeddings::{EmbeddingProvider, VectorIndex};
