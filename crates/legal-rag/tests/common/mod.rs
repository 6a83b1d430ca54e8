//! Shared fakes and helpers for router tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

use legal_rag::{
    config::RagConfig,
    generation::AnswerGenerator,
    ingestion::{DocumentLoader, TextChunker},
    providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider},
    report::ReportRenderer,
    retrieval::SqliteVectorStore,
    server::{state::AppState, RagServer},
    RagPipeline, Result,
};

pub const BOUNDARY: &str = "legal-rag-test-boundary";

/// Embeds by topic keyword so similarity is predictable
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(vec![
            if lower.contains("bail") { 1.0 } else { 0.0 },
            if lower.contains("theft") { 1.0 } else { 0.0 },
            0.05,
        ])
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Records every prompt and answers with a fixed text
#[derive(Default)]
pub struct RecordingLlm {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok("1. Overview\nDisclaimer: This is not legal advice.".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "recording"
    }
}

pub struct TestApp {
    pub router: Router,
    pub llm: Arc<RecordingLlm>,
    pub store: Option<SqliteVectorStore>,
    pub config: RagConfig,
}

pub fn test_config(root: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.reports.reports_dir = root.join("files");
    config.reports.upload_dir = root.join("uploads");
    config.vector_db.persist_dir = root.join("db");
    config
}

/// Build a router over fakes; `with_store` attaches an in-memory collection
pub fn test_app(config: RagConfig, with_store: bool) -> TestApp {
    let llm = Arc::new(RecordingLlm::default());
    let store = with_store.then(|| SqliteVectorStore::in_memory("legal_docs").unwrap());

    let pipeline = RagPipeline::new(
        Arc::new(KeywordEmbedder),
        AnswerGenerator::new(llm.clone()),
        ReportRenderer::new(&config.reports.reports_dir),
    )
    .with_store(
        store
            .clone()
            .map(|s| Arc::new(s) as Arc<dyn VectorStoreProvider>),
    )
    .with_loader(DocumentLoader::new(TextChunker::new(40, 10).unwrap()));

    let state = AppState::from_parts(config.clone(), pipeline);
    let router = RagServer::with_state(state).build_router();

    TestApp {
        router,
        llm,
        store,
        config,
    }
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("host", "legal.test:8000")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "legal.test:8000")
        .body(Body::empty())
        .unwrap()
}

/// Multipart request with optional text fields and one file
pub fn multipart_request(uri: &str, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("host", "legal.test:8000")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
