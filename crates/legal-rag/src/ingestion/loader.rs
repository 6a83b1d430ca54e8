//! Turns files and directories into chunk records

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Chunk, FileType};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Reads supported files and chunks their text
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    chunker: TextChunker,
}

impl DocumentLoader {
    /// Create a loader around a chunker
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Chunk already-extracted text into records for `file`
    pub fn chunk_text(&self, file: &str, source: &str, text: &str) -> Vec<Chunk> {
        self.chunker
            .chunk(text)
            .into_iter()
            .enumerate()
            .map(|(i, window)| Chunk::new(file, source, i, window))
            .collect()
    }

    /// Load and chunk one file; `source` metadata is the path as given
    pub fn load_single_file(&self, path: &Path) -> Result<Vec<Chunk>> {
        let file = file_name(path);
        let file_type = FileType::from_filename(&file)
            .ok_or_else(|| Error::file_parse(&file, "Unsupported file format"))?;

        let data = std::fs::read(path).map_err(|e| Error::file_parse(&file, e.to_string()))?;
        let parsed = FileParser::parse_as(file_type, &file, &data).map_err(|e| match e {
            err @ Error::FileParse { .. } => err,
            other => Error::file_parse(&file, other.to_string()),
        })?;

        Ok(self.chunk_text(&file, &path.to_string_lossy(), &parsed.content))
    }

    /// Recursively load every supported file under `root`.
    ///
    /// Unsupported files are ignored and unreadable ones are skipped with a
    /// warning. `source` metadata is relative to `root`.
    pub fn load_documents(&self, root: &Path) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let file = file_name(path);
            let Some(file_type) = FileType::from_filename(&file) else {
                continue;
            };

            let parsed = std::fs::read(path)
                .map_err(Error::from)
                .and_then(|data| FileParser::parse_as(file_type, &file, &data));

            match parsed {
                Ok(parsed) => {
                    let source = path
                        .strip_prefix(root)
                        .unwrap_or(path)
                        .to_string_lossy()
                        .into_owned();
                    let file_chunks = self.chunk_text(&file, &source, &parsed.content);
                    tracing::debug!("Loaded {} ({} chunks)", source, file_chunks.len());
                    chunks.extend(file_chunks);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        chunks
    }
}

/// Basename of a path as a string
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
