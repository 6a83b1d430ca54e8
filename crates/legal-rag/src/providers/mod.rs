//! Provider abstractions for the external collaborators: embeddings, LLM,
//! vector storage and case-law lookup.

pub mod case_law;
pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;
mod retry;
pub mod vector_store;

pub use case_law::{CaseLawLookup, StubCaseLookup};
pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use vector_store::VectorStoreProvider;

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;

/// Build the LLM provider selected by configuration
pub fn llm_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        LlmBackend::Gemini => Arc::new(GeminiClient::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };
    tracing::info!("LLM provider: {} ({})", provider.name(), provider.model());
    Ok(provider)
}
