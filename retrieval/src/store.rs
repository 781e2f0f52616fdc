//! Corpus storage and JSONL persistence.
//!
//! Chunks are persisted one JSON object per line; the concatenation of all
//! shard files is the full corpus. The merged embedding export additionally
//! carries each chunk's vector and is the single artifact the serving path
//! needs to rebuild the corpus store, metadata, and index.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use ragline_chunker::Chunk;
use ragline_embeddings::Embedding;

use crate::error::{Result, RetrievalError};

/// Row-aligned metadata for an indexed chunk.
///
/// A sequence of these, in the exact order vectors were inserted into the
/// index, is the join key from a search row back to its chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Chunk id.
    pub id: String,

    /// Source document of the chunk.
    pub source: String,

    /// Position of the chunk within its source.
    pub chunk_index: u32,
}

impl From<&Chunk> for ChunkRef {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            source: chunk.source.clone(),
            chunk_index: chunk.chunk_index,
        }
    }
}

/// Append-only, insertion-ordered store of chunks keyed by id.
#[derive(Default)]
pub struct CorpusStore {
    chunks: Vec<Chunk>,
    by_id: HashMap<String, usize>,
}

impl CorpusStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Ids must be unique across the whole corpus.
    pub fn insert(&mut self, chunk: Chunk) -> Result<()> {
        if self.by_id.contains_key(&chunk.id) {
            return Err(RetrievalError::DuplicateChunk(chunk.id));
        }
        self.by_id.insert(chunk.id.clone(), self.chunks.len());
        self.chunks.push(chunk);
        Ok(())
    }

    /// Look up a chunk by id.
    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.by_id.get(id).map(|&pos| &self.chunks[pos])
    }

    /// Look up a chunk's text by id.
    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).map(|chunk| chunk.text.as_str())
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over chunks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }
}

/// One line of the merged embedding export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Chunk id.
    pub id: String,

    /// Source document.
    pub source: String,

    /// Position within the source.
    pub chunk_index: u32,

    /// Chunk text.
    pub text: String,

    /// Unit-normalized embedding vector.
    pub embedding: Embedding,
}

impl ExportRecord {
    /// Pair a chunk with its embedding.
    pub fn new(chunk: &Chunk, embedding: Embedding) -> Self {
        Self {
            id: chunk.id.clone(),
            source: chunk.source.clone(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            embedding,
        }
    }
}

/// Write chunk records as one JSON object per line.
pub async fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let mut lines = String::new();
    for chunk in chunks {
        lines.push_str(&serde_json::to_string(chunk)?);
        lines.push('\n');
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, lines).await?;
    debug!("Wrote {} chunks to {}", chunks.len(), path.display());
    Ok(())
}

/// Write the merged embedding export as one JSON object per line.
pub async fn write_export(path: &Path, records: &[ExportRecord]) -> Result<()> {
    let mut lines = String::new();
    for record in records {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, lines).await?;
    info!("Wrote {} embedding records to {}", records.len(), path.display());
    Ok(())
}

/// Read the merged embedding export, preserving line order.
pub async fn read_export(path: &Path) -> Result<Vec<ExportRecord>> {
    let content = fs::read_to_string(path).await?;

    let mut records = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }

    info!("Loaded {} embedding records from {}", records.len(), path.display());
    Ok(records)
}
