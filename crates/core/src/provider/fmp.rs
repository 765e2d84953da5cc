use crate::config::Settings;
use crate::domain::metrics::roe_as_percent;
use crate::normalize;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Backup ROE source (Financial Modeling Prep ratios), only built when an API key is set.
#[derive(Debug, Clone)]
pub struct FmpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FmpClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.fmp_api_key.clone() else {
            return Ok(None);
        };
        let base_url = settings
            .fmp_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("FMP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, api_key, Duration::from_secs(timeout_secs)).map(Some)
    }

    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build fmp http client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// ROE in percent from the most recent ratios row that has one.
    pub async fn return_on_equity(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!("{}/ratios/{}", self.base_url.trim_end_matches('/'), symbol);
        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .context("fmp ratios request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read fmp response")?;
        if !status.is_success() {
            anyhow::bail!("fmp ratios HTTP {status}: {text}");
        }

        let rows = serde_json::from_str::<Vec<Value>>(&text)
            .with_context(|| format!("fmp ratios response is not a JSON array: {text}"))?;
        Ok(rows
            .iter()
            .find_map(|row| row.get("returnOnEquity").and_then(normalize::number))
            .map(roe_as_percent))
    }
}
