//! Plain-text extraction for text, PDF and Word documents

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Upper bound for a single pdf-extract run before falling back to lopdf
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Glyph names some PDF fonts leak into extracted text
const GLYPH_NAMES: &[(&str, &str)] = &[
    ("uni2010", "-"),
    ("uni2011", "-"),
    ("uni2013", "-"),
    ("uni2014", "--"),
    ("uni2018", "'"),
    ("uni2019", "'"),
    ("uni201C", "\""),
    ("uni201D", "\""),
    ("uni2022", "* "),
    ("uni2026", "..."),
    ("uni00A0", " "),
    ("uni00A7", "\u{00A7}"),
];

/// Typographic characters folded to ASCII
const TYPOGRAPHIC: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB00}', "ff"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up PDF text: glyph names, ligatures, null bytes
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph, replacement) in GLYPH_NAMES {
        if result.contains(glyph) {
            result = result.replace(glyph, replacement);
        }
    }
    for (ch, replacement) in TYPOGRAPHIC {
        if result.contains(*ch) {
            result = result.replace(*ch, replacement);
        }
    }

    result
}

/// Extracted text with its detected type
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename)
            .ok_or_else(|| Error::UnsupportedFileType(filename.to_string()))?;

        Self::parse_as(file_type, filename, data)
    }

    /// Parse bytes as a known file type
    pub fn parse_as(file_type: FileType, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match file_type {
            FileType::Txt => Ok(Self::parse_text(data)),
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
        }
    }

    /// Plain text, invalid UTF-8 replaced
    fn parse_text(data: &[u8]) -> ParsedDocument {
        ParsedDocument {
            file_type: FileType::Txt,
            content: String::from_utf8_lossy(data).into_owned(),
        }
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let raw = Self::extract_pdf_with_timeout(filename, data)?;
        let content = cleanup_pdf_text(&raw);

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content: content.trim().to_string(),
        })
    }

    /// Run pdf-extract on a worker thread; fall back to lopdf on error, panic or timeout
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed on {}: {}, trying fallback", filename, e);
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "PDF extraction of {} timed out after {:?}",
                    filename,
                    PDF_EXTRACT_TIMEOUT
                );
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed on {}", filename);
                Self::extract_pdf_text_fallback(filename, data)
            }
        }
    }

    /// Page-by-page extraction through lopdf, pages joined by newlines
    fn extract_pdf_text_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("Could not extract page {} of {}: {}", page_number, filename, e);
                    pages.push(String::new());
                }
            }
        }

        Ok(pages.join("\n"))
    }

    /// Parse DOCX document: paragraph texts joined by newlines
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut text = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            match child {
                                docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                                docx_rs::RunChild::Tab(_) => text.push('\t'),
                                _ => {}
                            }
                        }
                    }
                }
                paragraphs.push(text);
            }
        }

        Ok(ParsedDocument {
            file_type: FileType::Docx,
            content: paragraphs.join("\n").trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        use docx_rs::{Docx, Paragraph, Run};

        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_parse_text_is_lossy() {
        let parsed = FileParser::parse("notes.TXT", b"Section 498A\xff applies").unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert!(parsed.content.starts_with("Section 498A"));
        assert!(parsed.content.ends_with("applies"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileParser::parse("scan.png", b"...").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_parse_docx_joins_paragraphs() {
        let data = docx_bytes(&["Legal Notice", "Under Section 138 of the NI Act"]);
        let parsed = FileParser::parse("notice.docx", &data).unwrap();
        assert_eq!(parsed.file_type, FileType::Docx);
        assert_eq!(parsed.content, "Legal Notice\nUnder Section 138 of the NI Act");
    }

    #[test]
    fn test_invalid_docx_is_parse_error() {
        let err = FileParser::parse("broken.docx", b"not a zip").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let err = FileParser::parse("broken.pdf", b"This is not a PDF").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }

    #[test]
    fn test_parse_pdf_extracts_text() {
        let dir = tempfile::tempdir().unwrap();
        let report = crate::report::ReportRenderer::new(dir.path())
            .render("Section 498A", "Cruelty by husband or relatives", &[])
            .unwrap();
        let bytes = std::fs::read(&report.path).unwrap();

        let parsed = FileParser::parse(&report.filename, &bytes).unwrap();
        assert_eq!(parsed.file_type, FileType::Pdf);
        assert!(parsed.content.contains("Case Reference Report"));
        assert!(parsed.content.contains("Cruelty by husband"));
    }

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("\u{FB01}ling\0 \u{201C}bail\u{201D}");
        assert_eq!(cleaned, "filing \"bail\"");
    }
}
