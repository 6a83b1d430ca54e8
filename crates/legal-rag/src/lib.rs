//! legal-rag: Retrieval-augmented legal consultation backend
//!
//! Documents (PDF, DOCX, TXT) are chunked, embedded and stored in a local
//! SQLite vector collection. Questions retrieve the nearest chunks; when the
//! best match is not similar enough the answer is generated from the question
//! alone, augmented with a case-law lookup. Every answer is also rendered as
//! a downloadable PDF case report.

pub mod config;
pub mod error;
pub mod generation;
pub mod indexer;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{IngestOutcome, PipelineOutcome, RagPipeline};
pub use types::{
    document::{Chunk, ChunkMetadata, FileType},
    query::AskRequest,
    response::{Reference, RetrievalHit},
};
