//! Application state for the legal RAG server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::ingestion::{DocumentLoader, TextChunker};
use crate::pipeline::RagPipeline;
use crate::providers::{llm_from_config, EmbeddingProvider, OllamaEmbedder, VectorStoreProvider};
use crate::report::ReportRenderer;
use crate::retrieval::{RelevanceGate, SqliteVectorStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Retrieve, gate, generate, render
    pipeline: RagPipeline,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// A vector store that fails to open leaves the server running in
    /// degraded mode: queries take the fallback path and uploads are not
    /// indexed.
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing legal RAG application state...");

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embedding provider: {} ({}, {} dims)",
            embedder.name(),
            config.embeddings.model,
            embedder.dimensions()
        );

        let llm = llm_from_config(&config.llm)?;

        let store: Option<Arc<dyn VectorStoreProvider>> = match SqliteVectorStore::open(
            &config.vector_db.persist_dir,
            &config.vector_db.collection,
        ) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!(
                    "Vector store at {} unavailable, running without retrieval: {}",
                    config.vector_db.persist_dir.display(),
                    e
                );
                None
            }
        };

        std::fs::create_dir_all(&config.reports.reports_dir)?;
        std::fs::create_dir_all(&config.reports.upload_dir)?;

        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let pipeline = RagPipeline::new(
            embedder,
            AnswerGenerator::new(llm),
            ReportRenderer::new(&config.reports.reports_dir),
        )
        .with_store(store)
        .with_gate(RelevanceGate::new(config.retrieval.min_similarity))
        .with_top_k(config.retrieval.top_k)
        .with_loader(DocumentLoader::new(chunker));

        tracing::info!("Application state initialized");
        Ok(Self::from_parts(config, pipeline))
    }

    /// Assemble state from an already-built pipeline
    pub fn from_parts(config: RagConfig, pipeline: RagPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query pipeline
    pub fn pipeline(&self) -> &RagPipeline {
        &self.inner.pipeline
    }

    /// Directory uploads are saved to
    pub fn upload_dir(&self) -> &Path {
        &self.inner.config.reports.upload_dir
    }

    /// Where an upload with the given (already sanitized) name is saved
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.upload_dir().join(filename)
    }

    /// Absolute download URL of a report.
    ///
    /// Uses `server.public_base_url` when set, otherwise the request's Host.
    pub fn report_url(&self, host: Option<&str>, file: &str) -> String {
        let base = match &self.inner.config.server.public_base_url {
            Some(url) => url.clone(),
            None => {
                let host = host
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("localhost:{}", self.inner.config.server.port));
                format!("http://{}/", host)
            }
        };

        if base.ends_with('/') {
            format!("{}files/{}", base, file)
        } else {
            format!("{}/files/{}", base, file)
        }
    }
}
