//! # Embeddings
//!
//! Embedding generation and exact vector similarity search for the ragline
//! retrieval pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors via an external
//!   provider (OpenAI-compatible HTTP API)
//! - **Exact Search**: Dense top-k maximum-inner-product search with
//!   deterministic tie-breaking
//! - **Caching**: Content-hash-keyed caching of computed embeddings
//!
//! ## Architecture
//!
//! ```text
//! EmbeddingProvider ──► Embedding ──► VectorIndex
//!        │                                │
//!        ▼                                ▼
//!   CachedProvider                 search(query, k)
//! ```
//!
//! Vectors stored in the index are expected to be unit-normalized, so the
//! inner product returned by `search` equals the cosine similarity.

pub mod cache;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use cache::{CachedProvider, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use index::{SearchHit, VectorIndex};
pub use provider::{EmbeddingProvider, OpenAiProvider};
pub use similarity::{inner_product, l2_norm, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
