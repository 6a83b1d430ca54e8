//! Configuration for the legal RAG backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "LEGAL_RAG_CONFIG";

/// Config file read when `LEGAL_RAG_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "legal-rag.toml";

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval and relevance gating
    pub retrieval: RetrievalConfig,
    /// Report, upload and data directories
    pub reports: ReportsConfig,
    /// Document analysis prompt limits
    pub analysis: AnalysisConfig,
}

impl RagConfig {
    /// Load configuration from the file named by `LEGAL_RAG_CONFIG` (or
    /// `legal-rag.toml`), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse TOML configuration text
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(host) = std::env::var("LEGAL_RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LEGAL_RAG_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid LEGAL_RAG_PORT: {}", port),
            }
        }
        if let Ok(url) = std::env::var("LEGAL_RAG_PUBLIC_URL") {
            self.server.public_base_url = Some(url);
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.embeddings.base_url = url.clone();
            self.llm.ollama_base_url = url;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_similarity) {
            return Err(Error::Config(format!(
                "retrieval.min_similarity must be within [0, 1], got {}",
                self.retrieval.min_similarity
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        if self.vector_db.batch_size == 0 {
            return Err(Error::Config("vector_db.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Base URL used in report links; derived from the Host header when unset
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
            public_base_url: None,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL serving the embedding model
    pub base_url: String,
    /// Model to use (all-minilm = sentence-transformers/all-MiniLM-L6-v2)
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Concurrent embedding requests per batch
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            timeout_secs: 60,
            max_retries: 2,
            concurrency: 4,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 120,
        }
    }
}

/// Which generative backend answers queries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini (generativelanguage API)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub provider: LlmBackend,
    /// Gemini API key (usually supplied through GOOGLE_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Gemini model name
    pub model: String,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// Ollama generation model name
    pub ollama_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Gemini,
            api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2:3b".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Persistence directory
    pub persist_dir: PathBuf,
    /// Collection name
    pub collection: String,
    /// Rows written per transaction during bulk builds
    pub batch_size: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("db/chroma"),
            collection: "legal_docs".to_string(),
            batch_size: 256,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Hits requested per query
    pub top_k: usize,
    /// Minimum best-hit similarity for retrieved context to be used
    pub min_similarity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            min_similarity: 0.78,
        }
    }
}

/// Directories for generated reports, uploads and bulk-index input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Rendered PDF reports, served under /files
    pub reports_dir: PathBuf,
    /// Uploaded originals
    pub upload_dir: PathBuf,
    /// Source directory for the index builder
    pub data_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("files"),
            upload_dir: PathBuf::from("uploads"),
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Document analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Characters of an uploaded document included in the prompt
    pub max_document_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_document_chars: 8000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 120);
        assert_eq!(config.retrieval.top_k, 6);
        assert!((config.retrieval.min_similarity - 0.78).abs() < f32::EPSILON);
        assert_eq!(config.vector_db.collection, "legal_docs");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml(
            r#"
            [server]
            port = 9001

            [llm]
            provider = "ollama"

            [retrieval]
            min_similarity = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.provider, LlmBackend::Ollama);
        assert_eq!(config.retrieval.top_k, 6);
        assert!((config.retrieval.min_similarity - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_overlap_not_below_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = RagConfig::default();
        config.retrieval.min_similarity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = RagConfig::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
