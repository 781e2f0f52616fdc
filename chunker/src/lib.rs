//! # Chunker
//!
//! Deterministic text chunking for retrieval pipelines.
//!
//! Documents are split into overlapping segments using a sliding window that
//! snaps to natural boundaries (paragraph breaks, sentence terminators) when
//! one falls late enough in the window. Re-running the chunker on unchanged
//! input always reproduces byte-identical output, which keeps chunk ids
//! stable across ingestion runs.

pub mod error;
pub mod record;
pub mod splitter;

pub use error::{ChunkerError, Result};
pub use record::{Chunk, chunk_id};
pub use splitter::{Chunker, ChunkerConfig};
