//! Prompt templates for legal answer generation

use crate::types::RetrievalHit;

/// Context line used when retrieval produced nothing usable
pub const NO_CONTEXT: &str = "No internal references retrieved.";

/// Stand-in document text when extraction yields nothing
pub const NO_READABLE_TEXT: &str = "No readable text could be extracted.";

/// Characters of each hit included in the context block
const CONTEXT_SNIPPET_CHARS: usize = 600;

/// Prompt builder for legal queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block: one `- {content} [source: {source}]` line per hit
    pub fn build_context(hits: &[RetrievalHit]) -> String {
        if hits.is_empty() {
            return NO_CONTEXT.to_string();
        }

        hits.iter()
            .map(|hit| {
                format!(
                    "- {} [source: {}]",
                    truncate_chars(&hit.content, CONTEXT_SNIPPET_CHARS),
                    hit.source
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Six-section answer template for Indian legal questions
    pub fn legal_prompt(query: &str, context: &str) -> String {
        format!(
            r#"
You are an Indian legal assistant.
Task: Answer with 6 sections:
1. Overview / Meaning
2. IPC Codes / Acts / Amendments / Sections
3. Prominent Cases (with one-line relevance)
4. Precautions
5. Pros & Cons of Filing Case
6. Suggested Solution (based on past verdicts)

User Input:
{query}

Context (may be empty):
{context}

Always end with: "Disclaimer: This is not legal advice."
"#
        )
    }

    /// Prompt asking for a layperson analysis of an uploaded document
    pub fn document_analysis(document: &str, max_chars: usize) -> String {
        format!(
            "Simplify this legal document for a layperson. Add IPC/Acts, \
             prominent cases and compare verdict outcomes. \
             Give pros/cons of filing vs not filing, and suggestions.\n\n\
             Document:\n{}",
            document_excerpt(document, max_chars)
        )
    }

    /// Prompt answering a user question about an uploaded document
    pub fn query_with_document(query: &str, document: &str, max_chars: usize) -> String {
        format!(
            "User query: {}\n\nDocument:\n{}\n\n\
             Task: Provide overview, IPC/Acts/Sections, amendments, cases, \
             precautions, pros/cons, and solution suggestion.",
            query,
            document_excerpt(document, max_chars)
        )
    }

    /// Append case-lookup output to a prompt whose retrieval was rejected
    pub fn with_extra_context(prompt: &str, extra: &str) -> String {
        format!("{}\n\nExtra context: {}", prompt, extra)
    }
}

/// First `max_chars` characters of the document, or the no-text placeholder
fn document_excerpt(document: &str, max_chars: usize) -> &str {
    if document.trim().is_empty() {
        NO_READABLE_TEXT
    } else {
        truncate_chars(document, max_chars)
    }
}

/// Prefix of `text` holding at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
