//! Answer generation that always yields text

use std::sync::Arc;

use crate::providers::LlmProvider;
use crate::types::RetrievalHit;

use super::prompt::PromptBuilder;

/// Answer used when the model returns an empty completion
pub const NO_RESPONSE: &str = "No response generated.";

/// Wraps an LLM provider with the legal prompt template
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate an answer for `query` grounded on `hits`.
    ///
    /// Never fails: provider errors are returned as `"LLM error: ..."` text.
    pub async fn generate(&self, query: &str, hits: &[RetrievalHit]) -> String {
        let context = PromptBuilder::build_context(hits);
        let prompt = PromptBuilder::legal_prompt(query, &context);

        match self.llm.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => NO_RESPONSE.to_string(),
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Generation with {} failed: {}", self.llm.name(), e);
                format!("LLM error: {}", error_message(&e))
            }
        }
    }
}

/// Provider error text without the `LLM error:` prefix the enum adds
fn error_message(err: &crate::error::Error) -> String {
    match err {
        crate::error::Error::Llm(msg) => msg.clone(),
        other => other.to_string(),
    }
}
