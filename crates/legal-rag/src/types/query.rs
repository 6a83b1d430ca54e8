//! Query request types

use serde::Deserialize;

/// Body of `POST /ask`
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    /// Natural-language question; a missing field is treated as empty
    #[serde(default)]
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_query_defaults_to_empty() {
        let req: AskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.query.is_empty());
    }
}
