//! External case-law lookup used when retrieved context is not relevant

use async_trait::async_trait;
use crate::error::Result;

/// Source of extra case context for queries the index cannot answer
#[async_trait]
pub trait CaseLawLookup: Send + Sync {
    /// Fetch a textual summary of prominent cases for `query`
    async fn fetch_cases(&self, query: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Placeholder lookup until a case-law API is wired in
#[derive(Debug, Clone, Default)]
pub struct StubCaseLookup;

#[async_trait]
impl CaseLawLookup for StubCaseLookup {
    async fn fetch_cases(&self, query: &str) -> Result<String> {
        Ok(format!("Fetched prominent cases for query: {}", query))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
