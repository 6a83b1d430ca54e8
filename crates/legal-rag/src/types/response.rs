//! Response types returned by the API and the retrieval layer

use serde::Serialize;

/// A retrieved chunk with its score, derived per query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    /// Chunk text
    pub content: String,
    /// Source path (falls back to the filename, then "unknown")
    pub source: String,
    /// Bare filename
    pub file: String,
    /// Cosine distance to the query (lower is closer)
    pub distance: f32,
    /// `clamp(1 - distance, 0, 1)`
    pub similarity: f32,
}

impl RetrievalHit {
    /// Build a hit from a stored row and its cosine distance
    pub fn new(content: String, source: Option<String>, file: Option<String>, distance: f32) -> Self {
        let file = file.filter(|f| !f.is_empty());
        let source = source
            .filter(|s| !s.is_empty())
            .or_else(|| file.clone())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            content,
            source,
            file: file.unwrap_or_else(|| "unknown".to_string()),
            distance,
            similarity: similarity_from_distance(distance),
        }
    }
}

/// Convert cosine distance to a similarity in [0, 1]
pub fn similarity_from_distance(distance: f32) -> f32 {
    if distance.is_nan() {
        return 0.0;
    }
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Link to a generated artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    /// Artifact kind, always "pdf" for now
    #[serde(rename = "type")]
    pub kind: String,
    /// Report filename
    pub file: String,
    /// Absolute download URL
    pub url: String,
}

impl Reference {
    /// Reference to a rendered PDF report
    pub fn pdf(file: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: "pdf".to_string(),
            file: file.into(),
            url: url.into(),
        }
    }
}

/// Response of `POST /ask`
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub references: Vec<Reference>,
}

/// Response of `POST /upload`
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub chunks_added: usize,
    pub analysis: String,
    pub references: Vec<Reference>,
}

/// Response of `POST /ask-with-doc`
#[derive(Debug, Clone, Serialize)]
pub struct AskWithDocResponse {
    pub query: String,
    pub filename: String,
    pub chunks_added: usize,
    pub analysis: String,
    pub references: Vec<Reference>,
}

/// Response of `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub indexed_chunks: usize,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
