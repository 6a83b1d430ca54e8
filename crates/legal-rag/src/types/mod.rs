//! Core data types for documents, chunks, queries and responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkMetadata, FileType};
pub use query::AskRequest;
pub use response::{
    AskResponse, AskWithDocResponse, HealthResponse, Reference, RetrievalHit, StatusResponse,
    UploadResponse,
};
