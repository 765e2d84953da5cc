use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Transport or decoding failure of a text-generation call, with the raw payload kept for logs.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        Self {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_response_json: serde_json::from_str::<Value>(&body).ok(),
            raw_output: Some(body),
        }
    }

    pub fn parse(provider: Provider, detail: impl Into<String>, raw_output: Option<String>) -> Self {
        Self {
            provider,
            stage: "parse",
            detail: detail.into(),
            raw_output,
            raw_response_json: None,
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_json_body() {
        let err = LlmDiagnosticsError::http(
            Provider::OpenAI,
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"type":"rate_limit"}}"#.to_string(),
        );
        assert_eq!(err.stage, "http");
        assert_eq!(
            err.raw_response_json.as_ref().unwrap()["error"]["type"],
            "rate_limit"
        );
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn downcasts_from_anyhow() {
        let err: anyhow::Error = LlmDiagnosticsError::parse(Provider::Anthropic, "no json", None).into();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "parse");
    }
}
