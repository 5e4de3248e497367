//! Completion provider trait and error type.

use async_trait::async_trait;

/// Errors from completion calls. `Unavailable` is transport-level (the
/// provider was never reached or timed out); `RequestFailed` is a non-success
/// answer from the provider; `Parse` is a success answer with an unexpected
/// payload shape.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM provider unreachable: {0}")]
    Unavailable(String),
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM response malformed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            LlmError::Unavailable(e.to_string())
        } else if e.is_decode() {
            LlmError::Parse(e.to_string())
        } else {
            LlmError::RequestFailed(e.to_string())
        }
    }
}

/// A provider that generates text completions (used for text-to-SQL).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
    /// Human-readable provider name (e.g. "groq").
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLlm {
        response: String,
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.response.clone())
        }
        fn name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_llm_provider_trait_object() {
        let llm = MockLlm { response: "SELECT 1".to_string() };
        let result = llm.complete("anything").await.unwrap();
        assert_eq!(result, "SELECT 1");
        assert_eq!(llm.name(), "mock");
    }

    #[test]
    fn test_unavailable_display_names_the_llm() {
        let e = LlmError::Unavailable("connection refused".to_string());
        assert!(e.to_string().contains("LLM"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn test_request_failed_display_carries_detail() {
        let e = LlmError::RequestFailed("401 invalid api key".to_string());
        assert!(e.to_string().contains("invalid api key"));
    }
}
