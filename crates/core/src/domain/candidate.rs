use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One provider search hit. `symbol` may be empty for malformed records; the ranker drops those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub description: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

impl Candidate {
    pub fn new(symbol: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.map(str::to_string),
            raw: Value::Null,
        }
    }

    /// Builds a candidate from a raw search record (`{"symbol": .., "description": ..}`).
    pub fn from_record(record: Value) -> Self {
        let text = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let symbol = text("symbol").or_else(|| text("displaySymbol")).unwrap_or_default();
        let description = text("description");
        Self {
            symbol,
            description,
            raw: record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

/// Final answer of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTicker {
    pub symbol: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl From<RankedCandidate> for ResolvedTicker {
    fn from(ranked: RankedCandidate) -> Self {
        let Candidate {
            symbol,
            description,
            ..
        } = ranked.candidate;
        let display_name = description.unwrap_or_else(|| symbol.clone());
        Self {
            symbol,
            display_name,
        }
    }
}
