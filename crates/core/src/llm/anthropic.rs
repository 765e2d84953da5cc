use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{LlmClient, Provider, StructuredRequest};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 256;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(api_key, base_url, model, max_tokens, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
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
            max_tokens,
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::Anthropic, status, text).into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn request(&self, req: StructuredRequest) -> CreateMessageRequest {
        let tool_name = req.tool_name;
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(req.system),
            messages: vec![Message {
                role: "user",
                content: req.prompt,
            }],
            tools: vec![Tool {
                name: tool_name,
                description: req.tool_description,
                input_schema: req.schema,
            }],
            tool_choice: ToolChoice::Tool { name: tool_name },
        }
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    fn response_tool_input(res: &CreateMessageResponse, tool_name: &str) -> Option<serde_json::Value> {
        res.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input.clone()),
            _ => None,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate_structured(
        &self,
        req: StructuredRequest,
    ) -> anyhow::Result<serde_json::Value> {
        let tool_name = req.tool_name;
        let (raw_json, res) = self.create_message(self.request(req)).await?;

        // Tool output path.
        if let Some(input) = Self::response_tool_input(&res, tool_name) {
            return Ok(input);
        }

        // Fallback to text (should be rare with forced tool choice).
        let text = Self::response_text(&res);
        json::parse_object(&text).map_err(|err| {
            tracing::warn!(error = %err, stop_reason = ?res.stop_reason, "Anthropic returned no tool output");
            LlmDiagnosticsError {
                raw_response_json: Some(raw_json),
                ..LlmDiagnosticsError::parse(Provider::Anthropic, format!("{err:#}"), Some(text))
            }
            .into()
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base_url: String) -> AnthropicClient {
        AnthropicClient::new(
            "test-key".to_string(),
            base_url,
            DEFAULT_MODEL.to_string(),
            DEFAULT_MAX_TOKENS,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request() -> StructuredRequest {
        StructuredRequest {
            system: "sys".to_string(),
            prompt: "Company name: 카카오".to_string(),
            tool_name: "emit_english_name",
            tool_description: "Emit",
            schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn parses_tool_use_block() {
        let res: CreateMessageResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "tool_use", "id": "toolu_1", "name": "emit_english_name",
                 "input": {"english_name": "Kakao"}}
            ],
            "stop_reason": "tool_use"
        }))
        .unwrap();

        let input = AnthropicClient::response_tool_input(&res, "emit_english_name").unwrap();
        assert_eq!(input["english_name"], "Kakao");
        assert!(AnthropicClient::response_tool_input(&res, "other").is_none());
    }

    #[tokio::test]
    async fn falls_back_to_text_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                json!({
                    "content": [{"type": "text", "text": "```json\n{\"english_name\": \"Kakao\"}\n```"}],
                    "stop_reason": "end_turn"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let out = client(server.url()).generate_structured(request()).await.unwrap();
        assert_eq!(out["english_name"], "Kakao");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_is_diagnosable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let err = client(server.url()).generate_structured(request()).await.unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "http");
    }
}
