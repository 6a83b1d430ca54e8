//! Prompt construction and answer generation

pub mod answer;
pub mod prompt;

pub use answer::{AnswerGenerator, NO_RESPONSE};
pub use prompt::{PromptBuilder, NO_CONTEXT, NO_READABLE_TEXT};
