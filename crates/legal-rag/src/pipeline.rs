//! Retrieval-gated answer pipeline shared by every query endpoint

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{AnswerGenerator, PromptBuilder};
use crate::ingestion::{DocumentLoader, FileParser};
use crate::providers::{CaseLawLookup, EmbeddingProvider, StubCaseLookup, VectorStoreProvider};
use crate::report::{RenderedReport, ReportRenderer};
use crate::retrieval::RelevanceGate;
use crate::types::{Chunk, FileType, RetrievalHit};

/// Hits requested per query unless configured otherwise
pub const DEFAULT_TOP_K: usize = 6;

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Generated answer text
    pub answer: String,
    /// Hits passed to the generator; empty when the gate rejected retrieval
    pub hits_used: Vec<RetrievalHit>,
    /// Prompt text after fallback augmentation
    pub prompt: String,
    /// Rendered PDF report
    pub report: RenderedReport,
}

/// Result of ingesting an uploaded file
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Chunks written to the store
    pub chunks_added: usize,
    /// Full extracted text
    pub text: String,
}

/// Query pipeline: retrieve, gate, generate, render
pub struct RagPipeline {
    store: Option<Arc<dyn VectorStoreProvider>>,
    embedder: Arc<dyn EmbeddingProvider>,
    gate: RelevanceGate,
    lookup: Arc<dyn CaseLawLookup>,
    generator: AnswerGenerator,
    renderer: ReportRenderer,
    loader: DocumentLoader,
    top_k: usize,
}

impl RagPipeline {
    /// Create a pipeline without a store, default gate, stub case lookup and default chunking
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: AnswerGenerator,
        renderer: ReportRenderer,
    ) -> Self {
        Self {
            store: None,
            embedder,
            gate: RelevanceGate::default(),
            lookup: Arc::new(StubCaseLookup),
            generator,
            renderer,
            loader: DocumentLoader::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Attach the vector store; without one every query takes the fallback path
    pub fn with_store(mut self, store: Option<Arc<dyn VectorStoreProvider>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_gate(mut self, gate: RelevanceGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn CaseLawLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Chunks in the store; 0 when it is missing or fails
    pub async fn indexed_chunks(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.count().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Failed to count indexed chunks: {}", e);
                0
            }
        }
    }

    /// Nearest chunks for `text`; retrieval failures degrade to no hits
    pub async fn retrieve(&self, text: &str) -> Vec<RetrievalHit> {
        let Some(store) = &self.store else {
            return Vec::new();
        };

        let result = async {
            let embedding = self.embedder.embed(text).await?;
            store.query(&embedding, self.top_k).await
        }
        .await;

        match result {
            Ok(hits) => {
                for hit in &hits {
                    tracing::debug!("hit {} similarity={:.3}", hit.source, hit.similarity);
                }
                hits
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing without context: {}", e);
                Vec::new()
            }
        }
    }

    /// Answer `prompt_text`, falling back to case lookup on `fallback_hint`
    /// when retrieval is not relevant enough, and render the report.
    pub async fn run(&self, prompt_text: &str, fallback_hint: &str) -> Result<PipelineOutcome> {
        let hits = self.retrieve(prompt_text).await;

        let (prompt, hits_used) = if self.gate.is_relevant(&hits) {
            tracing::info!("Using {} retrieved chunks as context", hits.len());
            (prompt_text.to_string(), hits)
        } else {
            tracing::info!(
                "Retrieval below similarity {:.2}, using {} fallback",
                self.gate.min_similarity(),
                self.lookup.name()
            );
            let prompt = match self.lookup.fetch_cases(fallback_hint).await {
                Ok(extra) => PromptBuilder::with_extra_context(prompt_text, &extra),
                Err(e) => {
                    tracing::warn!("Case lookup failed: {}", e);
                    prompt_text.to_string()
                }
            };
            (prompt, Vec::new())
        };

        let answer = self.generator.generate(&prompt, &hits_used).await;

        let renderer = self.renderer.clone();
        let (report_prompt, report_answer, report_hits) =
            (prompt.clone(), answer.clone(), hits_used.clone());
        let report = tokio::task::spawn_blocking(move || {
            renderer.render(&report_prompt, &report_answer, &report_hits)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        Ok(PipelineOutcome {
            answer,
            hits_used,
            prompt,
            report,
        })
    }

    /// Save an upload to `path`, extract its text once, and index it
    /// in place of any earlier chunks of the same filename.
    pub async fn ingest_upload(&self, path: &Path, filename: &str, bytes: Vec<u8>) -> Result<IngestOutcome> {
        let file_type = FileType::from_filename(filename)
            .ok_or_else(|| Error::UnsupportedFileType(filename.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;
        tracing::info!("Saved upload {} ({} bytes)", path.display(), bytes.len());

        let name = filename.to_string();
        let parsed = tokio::task::spawn_blocking(move || FileParser::parse_as(file_type, &name, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let source = path.to_string_lossy();
        let chunks = self.loader.chunk_text(filename, &source, &parsed.content);
        let chunks_added = self.index_upload(filename, &chunks).await?;

        Ok(IngestOutcome {
            chunks_added,
            text: parsed.content,
        })
    }

    async fn index_upload(&self, filename: &str, chunks: &[Chunk]) -> Result<usize> {
        let Some(store) = &self.store else {
            tracing::warn!("Vector store unavailable, {} not indexed", filename);
            return Ok(0);
        };
        if chunks.is_empty() {
            tracing::info!("No text to index in {}", filename);
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let added = store.replace_file(filename, chunks, &embeddings).await?;
        tracing::info!("Indexed {} chunks from {}", added, filename);
        Ok(added)
    }
}
