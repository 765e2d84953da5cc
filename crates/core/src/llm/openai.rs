use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{LlmClient, Provider, StructuredRequest};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Chat Completions in JSON-object mode. The schema is spelled out in the system prompt.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(api_key, base_url, model, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    fn request(&self, req: StructuredRequest) -> ChatRequest {
        let system = format!("{}\nJSON schema:\n{}", req.system, req.schema);
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: req.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.0,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn generate_structured(
        &self,
        req: StructuredRequest,
    ) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request(req))
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::OpenAI, status, text).into());
        }

        let parsed = serde_json::from_str::<ChatResponse>(&text)
            .with_context(|| format!("failed to decode OpenAI response: {text}"))?;
        let content = parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default();

        json::parse_object(&content).map_err(|err| {
            LlmDiagnosticsError::parse(Provider::OpenAI, format!("{err:#}"), Some(content.clone()))
                .into()
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> StructuredRequest {
        StructuredRequest {
            system: "sys".to_string(),
            prompt: "Company name: 현대자동차".to_string(),
            tool_name: "emit_english_name",
            tool_description: "Emit",
            schema: json!({"type": "object", "required": ["english_name"]}),
        }
    }

    #[tokio::test]
    async fn returns_json_object_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant",
                        "content": "{\"english_name\": \"Hyundai Motor\"}"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAiClient::new(
            "sk-test".to_string(),
            server.url(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let out = client.generate_structured(request()).await.unwrap();
        assert_eq!(out["english_name"], "Hyundai Motor");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_json_content_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(json!({"choices": [{"message": {"content": "Hyundai Motor"}}]}).to_string())
            .create_async()
            .await;

        let client = OpenAiClient::new(
            "sk-test".to_string(),
            server.url(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = client.generate_structured(request()).await.unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "parse");
        assert_eq!(diag.raw_output.as_deref(), Some("Hyundai Motor"));
    }
}
