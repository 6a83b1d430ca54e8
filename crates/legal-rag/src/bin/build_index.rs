//! Bulk index builder: loads every supported file under a data directory
//! into a fresh vector collection
//!
//! Run with: cargo run -p legal-rag --features cli --bin legal-rag-index

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legal_rag::{
    config::RagConfig,
    indexer::index_chunks,
    ingestion::{DocumentLoader, TextChunker},
    providers::{EmbeddingProvider, OllamaEmbedder},
    retrieval::SqliteVectorStore,
};

#[derive(Parser)]
#[command(name = "legal-rag-index")]
#[command(about = "Build the legal document vector index")]
struct Cli {
    /// Directory of source documents (defaults to reports.data_dir)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Persistence directory (defaults to vector_db.persist_dir)
    #[arg(long)]
    persist_dir: Option<PathBuf>,

    /// Collection name (defaults to vector_db.collection)
    #[arg(long)]
    collection: Option<String>,

    /// Chunks embedded and written per batch
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legal_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load()?;

    let data_dir = cli.data.unwrap_or_else(|| config.reports.data_dir.clone());
    let persist_dir = cli.persist_dir.unwrap_or_else(|| config.vector_db.persist_dir.clone());
    let collection = cli.collection.unwrap_or_else(|| config.vector_db.collection.clone());
    let batch_size = cli.batch_size.unwrap_or(config.vector_db.batch_size);

    tracing::info!("Loading documents from {} ...", data_dir.display());
    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let loader = DocumentLoader::new(chunker);
    let walk_dir = data_dir.clone();
    let chunks = tokio::task::spawn_blocking(move || loader.load_documents(&walk_dir)).await?;
    tracing::info!("Loaded {} chunks", chunks.len());

    let embedder = OllamaEmbedder::new(&config.embeddings)?;
    if !embedder.health_check().await? {
        anyhow::bail!("Embedding provider not reachable at {}", config.embeddings.base_url);
    }

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks embedded ({percent}%)")?
            .progress_chars("#>-"),
    );

    // The existing index is only replaced once every chunk has an embedding
    let written = index_chunks(&embedder, &chunks, batch_size, |n| pb.inc(n as u64), || {
        tracing::info!("Building index at {} [{}] ...", persist_dir.display(), collection);
        SqliteVectorStore::recreate(&persist_dir, &collection)
    })
    .await?;
    pb.finish_with_message("done");

    tracing::info!("Index built: {} chunks persisted at {}", written, persist_dir.display());
    Ok(())
}
