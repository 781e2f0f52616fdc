//! Query-time retrieval: embed, search, join.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use ragline_chunker::Chunk;
use ragline_embeddings::{EmbeddingProvider, VectorIndex, normalize};

use crate::error::{Result, RetrievalError};
use crate::store::{ChunkRef, CorpusStore, ExportRecord, read_export};

/// One ranked retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    /// Chunk id.
    pub id: String,

    /// Source document.
    pub source: String,

    /// Position within the source.
    pub chunk_index: u32,

    /// Chunk text.
    pub text: String,

    /// Inner-product similarity with the query.
    pub score: f32,
}

/// Read-only retriever over a built index and its parallel metadata.
///
/// Everything here is immutable after construction, so a `Retriever` behind
/// an `Arc` serves any number of concurrent queries without locking.
pub struct Retriever {
    index: VectorIndex,
    refs: Vec<ChunkRef>,
    store: CorpusStore,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Assemble a retriever from an index, its row metadata, and the corpus.
    ///
    /// The metadata sequence must mirror the index rows exactly; a length
    /// mismatch means the two were built from different inputs.
    pub fn new(
        index: VectorIndex,
        refs: Vec<ChunkRef>,
        store: CorpusStore,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if refs.len() != index.len() {
            return Err(RetrievalError::CorpusDesync(format!(
                "index has {} rows but metadata has {} entries",
                index.len(),
                refs.len()
            )));
        }

        Ok(Self {
            index,
            refs,
            store,
            provider,
        })
    }

    /// Build a retriever from export records in their persisted order.
    pub fn from_records(
        records: Vec<ExportRecord>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let mut store = CorpusStore::new();
        let mut refs = Vec::with_capacity(records.len());
        let mut vectors = Vec::with_capacity(records.len());

        for record in records {
            let chunk = Chunk {
                id: record.id.clone(),
                source: record.source.clone(),
                chunk_index: record.chunk_index,
                text: record.text,
            };
            refs.push(ChunkRef {
                id: record.id,
                source: record.source,
                chunk_index: record.chunk_index,
            });
            vectors.push(record.embedding);
            store.insert(chunk)?;
        }

        let index = VectorIndex::build(&vectors)?;
        Self::new(index, refs, store, provider)
    }

    /// Load a retriever from a merged embedding export file.
    pub async fn load(path: &std::path::Path, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let records = read_export(path).await?;
        Self::from_records(records, provider)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the retriever serves an empty corpus.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Retrieve the top-k chunks for a query.
    ///
    /// The query is embedded with the same provider used at ingestion and
    /// unit-normalized the same way, so scores are cosine similarities. A
    /// search row that cannot be resolved to a stored chunk is a fatal
    /// consistency error, surfaced rather than dropped.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut query = self.provider.embed(query_text).await?;
        normalize(&mut query);

        let hits = self.index.search(&query, k)?;
        debug!("Query matched {} chunks", hits.len());

        hits.into_iter()
            .map(|hit| {
                let meta = self.refs.get(hit.row).ok_or_else(|| {
                    RetrievalError::CorpusDesync(format!("search row {} has no metadata", hit.row))
                })?;
                let text = self.store.text(&meta.id).ok_or_else(|| {
                    RetrievalError::CorpusDesync(format!(
                        "chunk {} is indexed but missing from the corpus store",
                        meta.id
                    ))
                })?;
                Ok(RetrievalResult {
                    id: meta.id.clone(),
                    source: meta.source.clone(),
                    chunk_index: meta.chunk_index,
                    text: text.to_string(),
                    score: hit.score,
                })
            })
            .collect()
    }
}
