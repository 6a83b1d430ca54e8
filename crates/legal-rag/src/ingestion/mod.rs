//! Document ingestion: text extraction, chunking and chunk-record loading

mod chunker;
mod loader;
mod parser;

pub use chunker::TextChunker;
pub use loader::DocumentLoader;
pub use parser::{FileParser, ParsedDocument};
