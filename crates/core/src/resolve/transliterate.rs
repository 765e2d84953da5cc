use crate::domain::query::{detect_script, Script};
use crate::error::TransliterationError;
use crate::llm::{LlmClient, StructuredRequest};
use std::sync::Arc;

const TOOL_NAME: &str = "emit_english_name";
const FIELD: &str = "english_name";

/// Turns a non-Latin company name into the Latin-script name used by the search provider.
#[async_trait::async_trait]
pub trait Transliterator: Send + Sync {
    async fn to_latin(&self, name: &str) -> Result<String, TransliterationError>;
}

/// Asks a text-generation service for `{"english_name": "..."}`. No internal retries.
pub struct LlmTransliterator {
    llm: Arc<dyn LlmClient>,
}

impl LlmTransliterator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn request(name: &str) -> StructuredRequest {
        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": [FIELD],
            "properties": {
                FIELD: {"type": "string"}
            }
        });

        StructuredRequest {
            system: [
                "You convert company names to the English name used on stock exchange listings.",
                "Return ONLY a JSON object with a single key \"english_name\". No prose, no markdown.",
                "If the company is listed abroad, use its official English listing name.",
                "Otherwise romanize the name.",
            ]
            .join("\n"),
            prompt: format!("Company name: {name}"),
            tool_name: TOOL_NAME,
            tool_description: "Emit the English listing name of the company",
            schema,
        }
    }
}

#[async_trait::async_trait]
impl Transliterator for LlmTransliterator {
    async fn to_latin(&self, name: &str) -> Result<String, TransliterationError> {
        let output = self
            .llm
            .generate_structured(Self::request(name))
            .await
            .map_err(TransliterationError::Unavailable)?;

        let latin = parse_output(&output)?;
        tracing::debug!(provider = ?self.llm.provider(), input = name, output = %latin, "transliterated query");
        Ok(latin)
    }
}

/// Validates the single-field shape and returns the trimmed name.
pub(crate) fn parse_output(output: &serde_json::Value) -> Result<String, TransliterationError> {
    let obj = output.as_object().ok_or_else(|| {
        TransliterationError::Unparseable(anyhow::anyhow!("expected JSON object, got {output}"))
    })?;
    if obj.len() != 1 {
        return Err(TransliterationError::Unparseable(anyhow::anyhow!(
            "expected only {FIELD}, got {output}"
        )));
    }

    let name = obj.get(FIELD).and_then(|v| v.as_str()).ok_or_else(|| {
        TransliterationError::Unparseable(anyhow::anyhow!("missing string field {FIELD}: {output}"))
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(TransliterationError::EmptyName);
    }
    if detect_script(name) == Script::NonLatin {
        return Err(TransliterationError::Unparseable(anyhow::anyhow!(
            "{FIELD} is still non-Latin: {name}"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use serde_json::json;

    struct CannedLlm(anyhow::Result<serde_json::Value>);

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn generate_structured(
            &self,
            req: StructuredRequest,
        ) -> anyhow::Result<serde_json::Value> {
            assert!(req.prompt.contains("삼성전자"));
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    async fn run(canned: anyhow::Result<serde_json::Value>) -> Result<String, TransliterationError> {
        LlmTransliterator::new(Arc::new(CannedLlm(canned)))
            .to_latin("삼성전자")
            .await
    }

    #[tokio::test]
    async fn returns_trimmed_name() {
        let out = run(Ok(json!({"english_name": " Samsung Electronics "}))).await;
        assert_eq!(out.unwrap(), "Samsung Electronics");
    }

    #[tokio::test]
    async fn service_failure_is_unavailable() {
        let out = run(Err(anyhow::anyhow!("connection refused"))).await;
        assert!(matches!(out, Err(TransliterationError::Unavailable(_))));
    }

    #[tokio::test]
    async fn wrong_shape_is_unparseable() {
        for bad in [
            json!("Samsung"),
            json!({"name": "Samsung"}),
            json!({"english_name": 5}),
            json!({"english_name": "Samsung", "korean_name": "삼성"}),
        ] {
            let out = run(Ok(bad)).await;
            assert!(matches!(out, Err(TransliterationError::Unparseable(_))));
        }
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let out = run(Ok(json!({"english_name": "  "}))).await;
        assert!(matches!(out, Err(TransliterationError::EmptyName)));
    }

    #[test]
    fn still_non_latin_output_is_rejected() {
        let out = parse_output(&json!({"english_name": "삼성"}));
        assert!(matches!(out, Err(TransliterationError::Unparseable(_))));
    }
}
