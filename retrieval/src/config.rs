//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use ragline_chunker::ChunkerConfig;

/// Configuration for ingestion and query-time retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunking parameters.
    pub chunker: ChunkerConfig,

    /// Number of chunk texts embedded per provider call.
    pub embed_batch_size: usize,

    /// Number of results retrieved per query.
    pub top_k: usize,

    /// Timeout applied to embedding and generation HTTP calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            embed_batch_size: 64,
            top_k: 5,
            request_timeout_secs: 30,
        }
    }
}
