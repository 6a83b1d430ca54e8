//! Legal RAG server binary
//!
//! Run with: cargo run -p legal-rag --bin legal-rag-server

use legal_rag::{config::RagConfig, providers::OllamaClient, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legal_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {} ({} dims)", config.embeddings.model, config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?}", config.llm.provider);
    tracing::info!(
        "  - Vector store: {} [{}]",
        config.vector_db.persist_dir.display(),
        config.vector_db.collection
    );
    tracing::info!(
        "  - Retrieval: top_k={}, min_similarity={}",
        config.retrieval.top_k,
        config.retrieval.min_similarity
    );

    // Embeddings always come from Ollama
    let ollama = OllamaClient::new(&config.embeddings.base_url, 5, 0)?;
    if ollama.health_check().await? {
        tracing::info!("Ollama is running at {}", config.embeddings.base_url);
    } else {
        tracing::warn!("Ollama not available at {}", config.embeddings.base_url);
        tracing::warn!("  Start it with `ollama serve` and pull the model: ollama pull {}", config.embeddings.model);
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /ask           - Ask a legal question");
    println!("  POST /upload        - Analyse and index a document");
    println!("  POST /ask-with-doc  - Ask about an uploaded document");
    println!("  GET  /files/<name>  - Download a case report");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
