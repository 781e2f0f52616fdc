//! `ragline` binary: ingest a corpus, then answer questions over it.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use ragline_embeddings::{CachedProvider, EmbeddingCache, EmbeddingProvider, OpenAiProvider};
use ragline_retrieval::pipeline::EXPORT_FILE;
use ragline_retrieval::{
    ChunkerConfig, ContextAssembler, GenerationProvider, IngestPipeline, OpenRouterProvider,
    RetrievalConfig, Retriever,
};

/// File name of the persisted embedding cache inside a store directory.
const CACHE_FILE: &str = "embedding-cache.json";

/// Upper bound on cached embeddings.
const CACHE_CAPACITY: usize = 10_000;

#[derive(Parser)]
#[command(name = "ragline", about = "Retrieval-augmented question answering", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk and embed every .txt file under a directory into a store.
    Ingest {
        /// Directory of source .txt documents.
        #[arg(long)]
        input: PathBuf,

        /// Directory to write store artifacts into.
        #[arg(long)]
        store: PathBuf,

        /// Maximum chunk length in bytes.
        #[arg(long, default_value_t = 1200)]
        chunk_size: usize,

        /// Bytes of overlap between consecutive chunks.
        #[arg(long, default_value_t = 200)]
        overlap: usize,

        /// Chunks embedded per provider request batch.
        #[arg(long, default_value_t = 64)]
        batch_size: usize,
    },

    /// Answer questions interactively over an ingested store.
    Ask {
        /// Store directory produced by `ingest`.
        #[arg(long)]
        store: PathBuf,

        /// Number of chunks retrieved per question.
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest {
            input,
            store,
            chunk_size,
            overlap,
            batch_size,
        } => {
            let config = RetrievalConfig {
                chunker: ChunkerConfig {
                    chunk_size,
                    overlap,
                },
                embed_batch_size: batch_size,
                ..RetrievalConfig::default()
            };
            ingest(&config, &input, &store).await
        }
        Command::Ask { store, top_k } => ask(&store, top_k).await,
    }
}

/// Build the embedding provider, with a disk-persisted cache under the store.
async fn embedding_provider(
    store: &std::path::Path,
    timeout_secs: u64,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider = OpenAiProvider::new().with_timeout(Duration::from_secs(timeout_secs));
    if !provider.is_available() {
        bail!("OPENAI_API_KEY is not set");
    }

    let cache = EmbeddingCache::with_persistence(store.join(CACHE_FILE), CACHE_CAPACITY)
        .await
        .context("loading embedding cache")?;
    Ok(Arc::new(CachedProvider::new(provider, cache)))
}

async fn ingest(
    config: &RetrievalConfig,
    input: &std::path::Path,
    store: &std::path::Path,
) -> anyhow::Result<()> {
    let provider = embedding_provider(store, config.request_timeout_secs).await?;
    let pipeline = IngestPipeline::new(config, provider)?;

    let stats = pipeline
        .ingest_dir(input, store)
        .await
        .context("ingesting corpus")?;

    info!(
        "Ingested {} documents: {} chunks, {} embedded, {} skipped",
        stats.documents, stats.chunks, stats.embedded, stats.skipped
    );
    println!(
        "Ingested {} documents into {} ({} chunks, {} skipped)",
        stats.documents,
        store.display(),
        stats.chunks,
        stats.skipped
    );
    Ok(())
}

async fn ask(store: &std::path::Path, top_k: usize) -> anyhow::Result<()> {
    let config = RetrievalConfig::default();
    let provider = embedding_provider(store, config.request_timeout_secs).await?;

    let export = store.join(EXPORT_FILE);
    let retriever = Retriever::load(&export, provider)
        .await
        .with_context(|| format!("loading store from {}", export.display()))?;
    info!("Loaded {} chunks", retriever.len());

    let generator =
        OpenRouterProvider::new().with_timeout(Duration::from_secs(config.request_timeout_secs));
    if !generator.is_available() {
        bail!("OPENROUTER_API_KEY is not set");
    }

    let assembler = ContextAssembler::new();
    let separator = "=".repeat(60);
    let stdin = std::io::stdin();

    println!("[ READY ] Ask a question, or type 'exit' to quit.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let results = retriever.retrieve(question, top_k).await?;
        let prompt = assembler.assemble(question, &results);
        let answer = generator.complete(&prompt).await?;

        println!("{answer}");
        println!("{separator}");
    }

    Ok(())
}
