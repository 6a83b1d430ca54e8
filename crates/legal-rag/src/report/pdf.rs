//! Case reference report rendering with lopdf
//!
//! Reports use the standard Helvetica faces with WinAnsiEncoding, so text is
//! folded to Latin-1 before it is drawn. Layout is a single column on A4 with
//! 2 cm margins; lines wrap at 80 columns and pages break automatically.

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::generation::prompt::truncate_chars;
use crate::types::RetrievalHit;

/// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
/// 2 cm in points
const MARGIN: i64 = 57;
/// Content stops here so it never collides with the footer
const CONTENT_BOTTOM: i64 = 85;
const WRAP_COLUMNS: usize = 80;
const SNIPPET_INDENT: i64 = 10;

const TITLE: &str = "Case Reference Report";
const FOOTER: &str = "Disclaimer: This report is for educational purposes only.";
const MAX_MATCHES: usize = 3;
const QUERY_CHARS: usize = 100;
const SNIPPET_CHARS: usize = 400;

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }
}

/// A rendered report on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Bare filename, as served under /files
    pub filename: String,
    /// Full path of the written file
    pub path: PathBuf,
}

/// Writes case reports into a directory
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    reports_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Render a report for `query` with `answer` and the top matches from `hits`
    pub fn render(&self, query: &str, answer: &str, hits: &[RetrievalHit]) -> Result<RenderedReport> {
        std::fs::create_dir_all(&self.reports_dir)?;

        let now = Local::now();

        let mut layout = Layout::new();
        layout.line(Font::Bold, 16, MARGIN, TITLE, 20);
        layout.line(
            Font::Regular,
            9,
            MARGIN,
            &format!("Generated: {}", now.format("%Y-%m-%d %H:%M:%S")),
            14,
        );
        layout.paragraphs(MARGIN, &format!("Query: {}", truncate_chars(query, QUERY_CHARS)), 14);

        if hits.is_empty() {
            layout.line(Font::Regular, 10, MARGIN, "No matches found.", 14);
        } else {
            layout.line(Font::Bold, 12, MARGIN, "Prominent Matches", 16);
            for (i, hit) in hits.iter().take(MAX_MATCHES).enumerate() {
                layout.paragraphs(
                    MARGIN,
                    &format!("{}. {} | {:.2}", i + 1, hit.source, hit.similarity),
                    14,
                );
                let snippet = truncate_chars(&hit.content, SNIPPET_CHARS);
                if !snippet.is_empty() {
                    layout.paragraphs(MARGIN + SNIPPET_INDENT, &format!("Snippet: {}", snippet), 12);
                }
                layout.gap(4);
            }
        }

        layout.line(Font::Bold, 12, MARGIN, "AI Analysis", 16);
        layout.paragraphs(MARGIN, answer, 12);

        let mut doc = layout.into_document()?;

        let stem = format!("case_report_{}", now.format("%Y%m%d_%H%M%S"));
        let (path, file) = create_unique(&self.reports_dir, &stem)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::report("Report path has no filename"))?;

        let mut writer = BufWriter::new(file);
        if let Err(e) = doc.save_to(&mut writer).and_then(|_| writer.flush()) {
            // Leave no half-written report behind under a name already handed out
            let _ = std::fs::remove_file(&path);
            return Err(Error::report(format!("Failed to write {}: {}", path.display(), e)));
        }

        tracing::info!("Rendered report {}", path.display());
        Ok(RenderedReport { filename, path })
    }
}

/// Create `{stem}.pdf`, or `{stem}_N.pdf` for the first N not yet taken.
///
/// Names are claimed with `create_new`, so two renders in the same second
/// never end up writing the same file.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    for n in 0u32.. {
        let name = if n == 0 {
            format!("{}.pdf", stem)
        } else {
            format!("{}_{}.pdf", stem, n)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(Error::report(format!("No free report name for {}", stem)))
}

/// Text flow across pages
struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn gap(&mut self, amount: i64) {
        self.y -= amount;
    }

    /// Draw one line at the cursor and advance by `leading`
    fn line(&mut self, font: Font, size: i64, x: i64, text: &str, leading: i64) {
        if self.y < CONTENT_BOTTOM {
            self.break_page();
        }
        draw_text(&mut self.current, font, size, x, self.y, text);
        self.y -= leading;
    }

    /// Wrapped body text; blank lines between paragraphs keep a small gap
    fn paragraphs(&mut self, x: i64, text: &str, leading: i64) {
        for para in text.split('\n') {
            for wrapped in textwrap::wrap(para, WRAP_COLUMNS) {
                self.line(Font::Regular, 10, x, &wrapped, leading);
            }
            if !para.trim().is_empty() {
                self.gap(leading * 3 / 10);
            }
        }
    }

    fn into_document(mut self) -> Result<Document> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.break_page();
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font = |doc: &mut Document, base: &str| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            })
        };
        let regular = font(&mut doc, "Helvetica");
        let bold = font(&mut doc, "Helvetica-Bold");
        let oblique = font(&mut doc, "Helvetica-Oblique");
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
                "F3" => oblique,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for mut operations in self.pages {
            draw_text(&mut operations, Font::Oblique, 9, MARGIN, MARGIN, FOOTER);
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| Error::report(format!("Failed to encode page: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }
}

fn draw_text(ops: &mut Vec<Operation>, font: Font, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Fold text into bytes the standard fonts can show
fn to_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\t' => out.push(b' '),
            ' '..='~' => out.push(ch as u8),
            '\u{00A0}'..='\u{00FF}' => out.push(ch as u32 as u8),
            '\u{2018}' | '\u{2019}' => out.push(b'\''),
            '\u{201C}' | '\u{201D}' => out.push(b'"'),
            '\u{2013}' | '\u{2014}' | '\u{2010}' | '\u{2011}' => out.push(b'-'),
            '\u{2022}' => out.push(b'*'),
            '\u{2026}' => out.extend_from_slice(b"..."),
            '\u{20B9}' => out.extend_from_slice(b"Rs."),
            c if c.is_control() => {}
            _ => out.push(b'?'),
        }
    }
    out
}
