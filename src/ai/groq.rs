//! Groq completion provider (OpenAI-compatible chat completions API).

use crate::ai::provider::{LlmError, LlmProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Hard cap on a single completion round-trip. No retries on expiry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GroqProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn parse_response(&self, json: &Value) -> Result<String, LlmError> {
        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| LlmError::Parse("missing choices[0].message.content".to_string()))
    }

    /// Build the failure detail for a non-2xx answer: the provider's own
    /// `error.message` when the body parses as the usual error envelope,
    /// otherwise the raw body text.
    fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());
        format!("groq returned {status}: {message}")
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.0,
            "max_tokens": 1024
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(format!("groq: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(Self::error_detail(status, &text)));
        }

        let json: Value = resp.json().await?;
        self.parse_response(&json)
    }

    fn name(&self) -> &str {
        "groq"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_provider_new() {
        let p = GroqProvider::new(
            "gsk-test",
            "mixtral-8x7b-32768",
            "https://api.groq.com/openai/v1/chat/completions",
        );
        assert_eq!(p.name(), "groq");
        assert_eq!(p.model, "mixtral-8x7b-32768");
        assert!(p.endpoint.ends_with("/chat/completions"));
    }

    #[test]
    fn test_groq_parse_response() {
        let p = GroqProvider::new("gsk-test", "mixtral-8x7b-32768", "http://localhost");
        let raw = serde_json::json!({
            "choices": [{"message": {"content": "  SELECT COUNT(*) FROM invoices  "}}]
        });
        assert_eq!(p.parse_response(&raw).unwrap(), "SELECT COUNT(*) FROM invoices");
    }

    #[test]
    fn test_groq_parse_response_missing_content() {
        let p = GroqProvider::new("gsk-test", "mixtral-8x7b-32768", "http://localhost");
        let raw = serde_json::json!({"choices": []});
        assert!(matches!(p.parse_response(&raw), Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_error_detail_prefers_provider_message() {
        let detail = GroqProvider::error_detail(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "Invalid API Key"}}"#,
        );
        assert!(detail.contains("401"));
        assert!(detail.contains("Invalid API Key"));
    }

    #[test]
    fn test_error_detail_falls_back_to_raw_body() {
        let detail =
            GroqProvider::error_detail(reqwest::StatusCode::BAD_GATEWAY, "upstream exploded");
        assert!(detail.contains("502"));
        assert!(detail.contains("upstream exploded"));
    }
}
