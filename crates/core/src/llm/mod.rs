pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;

use crate::config::Settings;
use std::sync::Arc;

/// Single-object structured generation: the model must answer with JSON matching `schema`.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system: String,
    pub prompt: String,
    pub tool_name: &'static str,
    pub tool_description: &'static str,
    pub schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "gpt" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_structured(&self, req: StructuredRequest)
        -> anyhow::Result<serde_json::Value>;
}

/// Picks the backend from `LLM_PROVIDER`, else whichever API key is configured.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    let provider = match settings.llm_provider.as_deref() {
        Some(name) => Provider::parse(name)
            .ok_or_else(|| anyhow::anyhow!("unknown LLM_PROVIDER: {name}"))?,
        None if settings.anthropic_api_key.is_some() => Provider::Anthropic,
        None => Provider::OpenAI,
    };

    Ok(match provider {
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
        Provider::OpenAI => Arc::new(openai::OpenAiClient::from_settings(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!(Provider::parse("Anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse(" openai "), Some(Provider::OpenAI));
        assert_eq!(Provider::parse("mistral"), None);
    }
}
