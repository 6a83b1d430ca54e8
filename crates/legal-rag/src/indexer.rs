//! Bulk indexing of chunk records into a vector store

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::Chunk;

/// Embed every chunk, then open the store with `open_store` and write the
/// chunks `batch_size` at a time.
///
/// The store is only opened once all embeddings succeeded, so an embedding
/// failure leaves whatever `open_store` would replace untouched. `on_batch`
/// receives the number of chunks embedded after each batch.
pub async fn index_chunks<S, O, F>(
    embedder: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    batch_size: usize,
    mut on_batch: F,
    open_store: O,
) -> Result<usize>
where
    S: VectorStoreProvider,
    O: FnOnce() -> Result<S>,
    F: FnMut(usize),
{
    if batch_size == 0 {
        return Err(Error::Config("batch size must be positive".into()));
    }

    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        embeddings.extend(embedder.embed_batch(&texts).await?);

        tracing::debug!("Embedded {}/{} chunks", embeddings.len(), chunks.len());
        on_batch(batch.len());
    }

    let store = open_store()?;
    let mut written = 0;
    for (batch, vectors) in chunks.chunks(batch_size).zip(embeddings.chunks(batch_size)) {
        store.add(batch, vectors).await?;
        written += batch.len();
    }

    Ok(written)
}
