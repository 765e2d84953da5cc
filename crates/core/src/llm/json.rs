use anyhow::Context;
use serde_json::Value;

/// Pulls the JSON payload out of a model completion.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parses a completion into a JSON object, tolerating fences and surrounding prose.
pub fn parse_object(text: &str) -> anyhow::Result<Value> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let value = serde_json::from_str::<Value>(&json_str)
        .with_context(|| format!("LLM output is not valid JSON: {json_str}"))?;
    anyhow::ensure!(value.is_object(), "LLM output is not a JSON object: {json_str}");
    Ok(value)
}
