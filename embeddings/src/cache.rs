//! Content-hash-keyed embedding cache.
//!
//! Ingestion recomputes every embedding from scratch by default; the cache
//! is an optional layer that keys computed vectors by a hash of the text and
//! the provider, so repeated runs over an unchanged corpus skip the network
//! round trips. It is never required for correctness.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;

/// Cache entry for an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    /// Content hash of the (provider, text) pair.
    key: String,

    /// The embedding vector.
    embedding: Embedding,

    /// Insertion sequence, used for oldest-first eviction.
    seq: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
}

/// Cache for embeddings to avoid redundant provider calls.
pub struct EmbeddingCache {
    /// In-memory cache.
    inner: Arc<RwLock<CacheInner>>,

    /// Path for persistent cache storage.
    cache_path: Option<PathBuf>,

    /// Maximum cache size.
    max_entries: usize,
}

impl EmbeddingCache {
    /// Create a new in-memory cache.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            cache_path: None,
            max_entries,
        }
    }

    /// Create a cache backed by a JSON file.
    pub async fn with_persistence(path: impl AsRef<Path>, max_entries: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let cache = Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            cache_path: Some(path.clone()),
            max_entries,
        };

        if path.exists() {
            cache.load().await?;
        }

        Ok(cache)
    }

    /// Compute the content hash for a cache lookup.
    fn hash_key(text: &str, namespace: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0x1f]);
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get an embedding from the cache.
    pub async fn get(&self, text: &str, namespace: &str) -> Option<Embedding> {
        let key = Self::hash_key(text, namespace);
        let inner = self.inner.read().await;
        inner.entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Put an embedding in the cache.
    pub async fn put(&self, text: &str, namespace: &str, embedding: Embedding) -> Result<()> {
        let key = Self::hash_key(text, namespace);

        {
            let mut inner = self.inner.write().await;

            // Evict the oldest entry when at capacity.
            if inner.entries.len() >= self.max_entries && !inner.entries.contains_key(&key) {
                let oldest_key = inner
                    .entries
                    .values()
                    .min_by_key(|e| e.seq)
                    .map(|e| e.key.clone());
                if let Some(oldest_key) = oldest_key {
                    inner.entries.remove(&oldest_key);
                }
            }

            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.insert(
                key.clone(),
                CacheEntry {
                    key,
                    embedding,
                    seq,
                },
            );
            debug!("Cached embedding ({namespace})");
        }

        if self.cache_path.is_some() {
            self.save().await?;
        }

        Ok(())
    }

    /// Check if an embedding is cached.
    pub async fn contains(&self, text: &str, namespace: &str) -> bool {
        let key = Self::hash_key(text, namespace);
        self.inner.read().await.entries.contains_key(&key)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Clear the entire cache.
    pub async fn clear(&self) {
        self.inner.write().await.entries.clear();
        info!("Cleared embedding cache");
    }

    /// Save the cache to disk.
    async fn save(&self) -> Result<()> {
        if let Some(ref path) = self.cache_path {
            let content = {
                let inner = self.inner.read().await;
                let entries: Vec<&CacheEntry> = inner.entries.values().collect();
                serde_json::to_string(&entries)?
            };

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(path, content).await?;
            debug!("Saved embedding cache to {}", path.display());
        }
        Ok(())
    }

    /// Load the cache from disk.
    async fn load(&self) -> Result<()> {
        if let Some(ref path) = self.cache_path {
            let content = fs::read_to_string(path).await?;
            let entries: Vec<CacheEntry> = serde_json::from_str(&content)?;

            let mut inner = self.inner.write().await;
            for entry in entries {
                inner.next_seq = inner.next_seq.max(entry.seq + 1);
                inner.entries.insert(entry.key.clone(), entry);
            }

            info!("Loaded {} cache entries from disk", inner.entries.len());
        }
        Ok(())
    }
}

/// A provider wrapper that serves embeddings from the cache when possible.
pub struct CachedProvider<P> {
    provider: P,
    cache: EmbeddingCache,
}

impl<P> CachedProvider<P>
where
    P: EmbeddingProvider,
{
    /// Wrap a provider with a cache.
    pub fn new(provider: P, cache: EmbeddingCache) -> Self {
        Self { provider, cache }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait]
impl<P> EmbeddingProvider for CachedProvider<P>
where
    P: EmbeddingProvider,
{
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(embedding) = self.cache.get(text, self.provider.name()).await {
            debug!("Cache hit for embedding");
            return Ok(embedding);
        }

        let embedding = self.provider.embed(text).await?;
        self.cache
            .put(text, self.provider.name(), embedding.clone())
            .await?;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut results: Vec<Option<Embedding>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(text, self.provider.name()).await {
                Some(embedding) => results.push(Some(embedding)),
                None => {
                    results.push(None);
                    misses.push(i);
                }
            }
        }

        if !misses.is_empty() {
            let miss_texts: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            let embedded = self.provider.embed_batch(&miss_texts).await?;
            for (&i, embedding) in misses.iter().zip(embedded) {
                self.cache
                    .put(&texts[i], self.provider.name(), embedding.clone())
                    .await?;
                results[i] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| EmbeddingError::Cache("missing batch result".to_string())))
            .collect()
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, 1.0])
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_cache_put_get() {
        let cache = EmbeddingCache::new(100);
        let embedding = vec![1.0, 2.0, 3.0];

        cache.put("hello", "model-1", embedding.clone()).await.unwrap();

        let retrieved = cache.get("hello", "model-1").await;
        assert_eq!(retrieved, Some(embedding));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = EmbeddingCache::new(100);
        assert!(cache.get("not cached", "model-1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_namespaces_are_distinct() {
        let cache = EmbeddingCache::new(100);
        cache.put("hello", "model-1", vec![1.0]).await.unwrap();
        assert!(cache.get("hello", "model-2").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_eviction_drops_oldest() {
        let cache = EmbeddingCache::new(2);

        cache.put("a", "model", vec![1.0]).await.unwrap();
        cache.put("b", "model", vec![2.0]).await.unwrap();
        cache.put("c", "model", vec![3.0]).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert!(!cache.contains("a", "model").await);
        assert!(cache.contains("c", "model").await);
    }

    #[tokio::test]
    async fn test_cached_provider_skips_repeat_calls() {
        let provider = CachedProvider::new(CountingProvider::new(), EmbeddingCache::new(100));

        let first = provider.embed("hello").await.unwrap();
        let second = provider.embed("hello").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_provider_batch_only_embeds_misses() {
        let provider = CachedProvider::new(CountingProvider::new(), EmbeddingCache::new(100));

        provider.embed("known").await.unwrap();
        let texts = vec!["known".to_string(), "new".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        // One call for the warmup, one for the single miss.
        assert_eq!(provider.provider.calls.load(Ordering::SeqCst), 2);
    }
}
