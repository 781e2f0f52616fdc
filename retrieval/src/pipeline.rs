//! Batch ingestion: chunk documents, embed, and export.
//!
//! One ingestion run rebuilds everything from scratch. Documents are
//! processed in sorted path order so chunk indices and index row order are
//! deterministic regardless of where the corpus files came from. A chunk
//! whose text cannot be embedded is reported and excluded from the export,
//! never indexed with a placeholder vector; one bad document does not abort
//! the rest of the corpus.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use ragline_chunker::{Chunk, Chunker};
use ragline_embeddings::{EmbeddingError, EmbeddingProvider, normalize};

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::store::{ExportRecord, write_chunks, write_export};

/// File name of the merged embedding export inside a store directory.
pub const EXPORT_FILE: &str = "embeddings.jsonl";

/// Subdirectory holding per-document chunk shards.
pub const CHUNKS_DIR: &str = "chunks";

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Documents read.
    pub documents: usize,

    /// Chunks produced.
    pub chunks: usize,

    /// Chunks embedded and exported.
    pub embedded: usize,

    /// Chunks excluded because their text could not be embedded.
    pub skipped: usize,
}

/// Output of an in-memory ingestion run.
pub struct IngestOutput {
    /// All chunks, in document order.
    pub chunks: Vec<Chunk>,

    /// Export records for the chunks that were embedded, in chunk order.
    pub records: Vec<ExportRecord>,

    /// Run counters.
    pub stats: IngestStats,
}

/// Batch ingestion pipeline.
pub struct IngestPipeline {
    chunker: Chunker,
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl IngestPipeline {
    /// Create a pipeline, validating the chunking configuration up front.
    pub fn new(config: &RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(config.chunker)?,
            provider,
            batch_size: config.embed_batch_size.max(1),
        })
    }

    /// Chunk and embed documents given as `(source, text)` pairs, in order.
    pub async fn ingest_documents(&self, documents: &[(String, String)]) -> Result<IngestOutput> {
        let mut stats = IngestStats::default();
        let mut chunks = Vec::new();

        for (source, text) in documents {
            let doc_chunks = self.chunker.chunk_document(source, text);
            stats.documents += 1;
            stats.chunks += doc_chunks.len();
            chunks.extend(doc_chunks);
        }

        info!(
            "Chunked {} documents into {} chunks",
            stats.documents, stats.chunks
        );

        let mut records = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            match self.provider.embed_batch(&texts).await {
                Ok(embeddings) if embeddings.len() == batch.len() => {
                    for (chunk, mut embedding) in batch.iter().zip(embeddings) {
                        normalize(&mut embedding);
                        records.push(ExportRecord::new(chunk, embedding));
                        stats.embedded += 1;
                    }
                }
                Ok(embeddings) => {
                    return Err(EmbeddingError::InvalidResponse(format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    ))
                    .into());
                }
                Err(err) => {
                    // Partial coverage: retry chunks one at a time so a
                    // single bad text only excludes itself.
                    warn!("Batch embedding failed ({err}), retrying chunks individually");
                    for chunk in batch {
                        match self.provider.embed(&chunk.text).await {
                            Ok(mut embedding) => {
                                normalize(&mut embedding);
                                records.push(ExportRecord::new(chunk, embedding));
                                stats.embedded += 1;
                            }
                            Err(err) => {
                                warn!("Excluding chunk {} from the index: {err}", chunk.id);
                                stats.skipped += 1;
                            }
                        }
                    }
                }
            }
        }

        info!(
            "Embedded {} chunks ({} skipped)",
            stats.embedded, stats.skipped
        );

        Ok(IngestOutput {
            chunks,
            records,
            stats,
        })
    }

    /// Ingest every `.txt` file under `input` and write store artifacts.
    ///
    /// Writes one chunk JSONL shard per document under `store_dir/chunks/`
    /// (mirroring the input tree) and the merged embedding export at
    /// `store_dir/embeddings.jsonl`.
    pub async fn ingest_dir(&self, input: &Path, store_dir: &Path) -> Result<IngestStats> {
        let mut paths: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
            })
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            let rel = path.strip_prefix(input).unwrap_or(path.as_path());
            let source = rel.to_string_lossy().replace('\\', "/");
            let text = fs::read_to_string(path).await?;
            documents.push((source, text));
        }

        let output = self.ingest_documents(&documents).await?;

        // Per-document chunk shards, written before the export so the raw
        // chunking survives even when some embeddings failed.
        let chunks_dir = store_dir.join(CHUNKS_DIR);
        for (source, _) in &documents {
            let doc_chunks: Vec<Chunk> = output
                .chunks
                .iter()
                .filter(|chunk| chunk.source == *source)
                .cloned()
                .collect();
            if doc_chunks.is_empty() {
                continue;
            }
            let shard = chunks_dir.join(Path::new(source).with_extension("jsonl"));
            write_chunks(&shard, &doc_chunks).await?;
        }

        write_export(&store_dir.join(EXPORT_FILE), &output.records).await?;

        Ok(output.stats)
    }
}
