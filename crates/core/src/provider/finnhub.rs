use crate::config::Settings;
use crate::domain::candidate::Candidate;
use crate::resolve::SymbolSearch;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Primary structured-data provider: fuzzy symbol search and a flat fundamentals mapping.
///
/// No retries here; a failed call is absorbed by the caller.
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let token = settings.require_finnhub_api_key()?.to_string();
        let base_url = settings
            .finnhub_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("FINNHUB_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, token, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build finnhub http client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .with_context(|| format!("finnhub request failed: {path}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read finnhub response")?;
        if !status.is_success() {
            anyhow::bail!("finnhub HTTP {status} for {path}: {text}");
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("finnhub response is not valid JSON: {text}"))
    }

    async fn try_search(&self, query: &str) -> Result<Vec<Candidate>> {
        let body = self.get_json("/search", &[("q", query)]).await?;
        let records = body
            .get("result")
            .and_then(Value::as_array)
            .context("finnhub search response has no result array")?;
        Ok(records.iter().cloned().map(Candidate::from_record).collect())
    }

    /// The `metric` object of `/stock/metric`. Errors are for the caller to absorb.
    pub async fn fundamentals(&self, symbol: &str) -> Result<serde_json::Map<String, Value>> {
        let body = self
            .get_json("/stock/metric", &[("symbol", symbol), ("metric", "all")])
            .await?;
        match body.get("metric") {
            Some(Value::Object(m)) => Ok(m.clone()),
            _ => anyhow::bail!("finnhub metric response has no metric object"),
        }
    }
}

#[async_trait::async_trait]
impl SymbolSearch for FinnhubClient {
    /// Best-effort: any failure degrades to an empty candidate list.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        match self.try_search(query).await {
            Ok(candidates) => Ok(candidates),
            Err(err) => {
                tracing::warn!(query, error = %err, "symbol search failed; treating as no candidates");
                Ok(Vec::new())
            }
        }
    }
}
