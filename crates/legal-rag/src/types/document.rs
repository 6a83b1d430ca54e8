//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported input formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
}

impl FileType {
    /// Detect file type from extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect file type from a filename or path
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path the text was read from (relative to the data root for bulk indexing)
    pub source: String,
    /// Bare filename
    pub file: String,
}

/// A window of document text, the unit stored in the vector store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// `<filename>-<index>`
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Source information
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk for the `index`-th window of `file`
    pub fn new(file: &str, source: &str, index: usize, text: String) -> Self {
        Self {
            id: Self::make_id(file, index),
            text,
            metadata: ChunkMetadata {
                source: source.to_string(),
                file: file.to_string(),
            },
        }
    }

    /// Build the stable chunk id
    pub fn make_id(file: &str, index: usize) -> String {
        format!("{}-{}", file, index)
    }
}
