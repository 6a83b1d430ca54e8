//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{Chunk, RetrievalHit};

/// Trait for a persistent chunk collection with nearest-neighbour search
///
/// Implementations:
/// - `SqliteVectorStore`: SQLite-backed collection with exact cosine search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert or overwrite chunks by id; `embeddings[i]` belongs to `chunks[i]`
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Remove every chunk of `file`, then add the given chunks
    async fn replace_file(
        &self,
        file: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize>;

    /// Up to `k` nearest chunks, ordered by ascending cosine distance
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalHit>>;

    /// Number of chunks in the collection
    async fn count(&self) -> Result<usize>;

    /// Remove every chunk in the collection
    async fn reset(&self) -> Result<()>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
