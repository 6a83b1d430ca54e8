//! Ollama-based providers for embeddings and generation

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{retry_request, Attempt};

/// Thin Ollama HTTP API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(base_url: &str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        retry_request(self.max_retries, "Ollama embedding", || async {
            let response = self
                .client
                .post(&url)
                .json(&EmbedRequest { model, prompt: text })
                .send()
                .await
                .map_err(|e| {
                    Attempt::send_failed(e, |e| Error::embedding(format!("Embedding request failed: {}", e)))
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(Attempt::status_failed(
                    status,
                    Error::embedding(format!("Embedding failed: HTTP {}", status)),
                ));
            }

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| {
                    Error::embedding(format!("Failed to parse embedding response: {}", e.without_url()))
                })?;

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Generate a completion with retry
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        retry_request(self.max_retries, "Ollama generation", || async {
            let request = GenerateRequest {
                model,
                prompt,
                stream: false,
                options: GenerateOptions { temperature },
            };

            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| Attempt::send_failed(e, |e| Error::llm(format!("Generation request failed: {}", e))))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Attempt::status_failed(
                    status,
                    Error::llm(format!("Generation failed: HTTP {} - {}", status, body)),
                ));
            }

            let generate_response: GenerateResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse generation response: {}", e.without_url())))?;

            Ok(generate_response.response)
        })
        .await
    }
}

/// Ollama embedding provider (all-minilm by default)
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimensions: usize,
    concurrency: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.base_url, config.timeout_secs, config.max_retries)?,
            model: config.model.clone(),
            dimensions: config.dimensions,
            concurrency: config.concurrency.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(&self.model, text).await?;
        if embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Ollama has no batch endpoint; run a bounded number of requests at once
        let requests: Vec<_> = texts.iter().map(|text| self.embed(text)).collect();
        futures::stream::iter(requests)
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(&config.ollama_base_url, config.timeout_secs, config.max_retries)?,
            model: config.ollama_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.model);
        self.client.generate(&self.model, prompt, self.temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embed_config(base_url: &str, dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: base_url.to_string(),
            dimensions,
            max_retries: 0,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let server = MockServer::start().await;
        for (prompt, value) in [("first", 1.0), ("second", 2.0), ("third", 3.0)] {
            Mock::given(method("POST"))
                .and(path("/api/embeddings"))
                .and(body_partial_json(json!({ "prompt": prompt })))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "embedding": [value, 0.0] })),
                )
                .mount(&server)
                .await;
        }

        let embedder = OllamaEmbedder::new(&embed_config(&server.uri(), 2)).unwrap();
        let texts = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimensions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.1, 0.2, 0.3] })))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&embed_config(&server.uri(), 384)).unwrap();
        let err = embedder.embed("bail").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_generate_returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "model": "llama3.2:3b", "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Overview..." })))
            .mount(&server)
            .await;

        let config = LlmConfig {
            ollama_base_url: server.uri(),
            max_retries: 0,
            ..LlmConfig::default()
        };
        let llm = OllamaLlm::new(&config).unwrap();
        assert_eq!(llm.generate("prompt").await.unwrap(), "Overview...");
    }

    #[tokio::test]
    async fn test_generate_http_error_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let config = LlmConfig {
            ollama_base_url: server.uri(),
            max_retries: 0,
            ..LlmConfig::default()
        };
        let err = OllamaLlm::new(&config).unwrap().generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[tokio::test]
    async fn test_embed_batch_empty() {
        let embedder = OllamaEmbedder::new(&embed_config("http://127.0.0.1:9", 384)).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'llama3.2:3b' not found"))
            .expect(1)
            .mount(&server)
            .await;

        let config = LlmConfig {
            ollama_base_url: server.uri(),
            max_retries: 3,
            ..LlmConfig::default()
        };
        let err = OllamaLlm::new(&config).unwrap().generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.5, 0.5] })))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            max_retries: 1,
            ..embed_config(&server.uri(), 2)
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();
        assert_eq!(embedder.embed("bail").await.unwrap(), vec![0.5, 0.5]);
    }
}
