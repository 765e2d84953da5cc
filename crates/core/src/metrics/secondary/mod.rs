//! Secondary path for local-exchange symbols: a JSON summary first, then the item page.

pub mod html;
pub mod summary;

use crate::config::Settings;
use crate::domain::metrics::{derive_roe, MetricSet};
use crate::metrics::LocalScraper;
use crate::provider::http::{RetryingClient, StatusError, DEFAULT_BASE_BACKOFF, DEFAULT_RETRIES};
use anyhow::Result;
use scraper::Html;
use std::time::Duration;

const DEFAULT_SUMMARY_BASE_URL: &str = "https://m.stock.naver.com/api/stock";
const DEFAULT_FINANCE_BASE_URL: &str = "https://finance.naver.com";
const ITEM_PAGE_PATH: &str = "/item/main.naver";
const DEFAULT_TIMEOUT_SECS: u64 = 8;
const EMPTY_BODY_RETRY_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Per,
    Pbr,
    Roe,
    Eps,
    Bps,
}

impl Field {
    pub const ALL: [Field; 5] = [Field::Per, Field::Pbr, Field::Roe, Field::Eps, Field::Bps];

    /// Key in the summary payload.
    pub fn key(self) -> &'static str {
        match self {
            Field::Per => "per",
            Field::Pbr => "pbr",
            Field::Roe => "roe",
            Field::Eps => "eps",
            Field::Bps => "bps",
        }
    }

    /// Label as printed in page headers.
    pub fn label(self) -> &'static str {
        match self {
            Field::Per => "PER",
            Field::Pbr => "PBR",
            Field::Roe => "ROE",
            Field::Eps => "EPS",
            Field::Bps => "BPS",
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            Field::Per => "_per",
            Field::Pbr => "_pbr",
            Field::Roe => "_roe",
            Field::Eps => "_eps",
            Field::Bps => "_bps",
        }
    }
}

/// Raw figures gathered for one code; EPS and BPS only feed the ROE derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalFundamentals {
    pub per: Option<f64>,
    pub pbr: Option<f64>,
    pub roe: Option<f64>,
    pub eps: Option<f64>,
    pub bps: Option<f64>,
}

impl LocalFundamentals {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Per => self.per,
            Field::Pbr => self.pbr,
            Field::Roe => self.roe,
            Field::Eps => self.eps,
            Field::Bps => self.bps,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        let slot = match field {
            Field::Per => &mut self.per,
            Field::Pbr => &mut self.pbr,
            Field::Roe => &mut self.roe,
            Field::Eps => &mut self.eps,
            Field::Bps => &mut self.bps,
        };
        *slot = value;
    }

    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// ROE is derived from EPS/BPS only when no direct figure was found.
    pub fn into_metric_set(self) -> MetricSet {
        MetricSet {
            per: self.per,
            pbr: self.pbr,
            roe: self.roe.or_else(|| derive_roe(self.eps, self.bps)),
        }
    }
}

enum SummaryResponse {
    Body(String),
    // No body at all: transport failure, or a success/error status with nothing in it.
    Empty,
    // Error status that came with a body.
    Rejected,
}

/// Scrapes the public Naver Finance pages for a 6-digit code.
///
/// Stage one reads the JSON summary (one extra attempt only if no body came back).
/// Stage two fetches the item page once, only when stage one left something missing,
/// and fills only the missing fields.
#[derive(Debug, Clone)]
pub struct NaverScraper {
    http: RetryingClient,
    summary_base_url: String,
    finance_base_url: String,
    empty_body_retry_delay: Duration,
}

impl NaverScraper {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("NAVER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = std::env::var("NAVER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = RetryingClient::new(
            Duration::from_secs(timeout_secs),
            retries,
            DEFAULT_BASE_BACKOFF,
        )?;
        Ok(Self::new(
            http,
            settings
                .naver_summary_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_BASE_URL.to_string()),
            settings
                .naver_finance_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_FINANCE_BASE_URL.to_string()),
        ))
    }

    pub fn new(http: RetryingClient, summary_base_url: String, finance_base_url: String) -> Self {
        Self {
            http,
            summary_base_url,
            finance_base_url,
            empty_body_retry_delay: EMPTY_BODY_RETRY_DELAY,
        }
    }

    pub fn with_empty_body_retry_delay(mut self, delay: Duration) -> Self {
        self.empty_body_retry_delay = delay;
        self
    }

    async fn summary_response(&self, code: &str) -> SummaryResponse {
        let url = format!(
            "{}/{}/integration",
            self.summary_base_url.trim_end_matches('/'),
            code
        );
        match self.http.get(&url, &[]).await {
            Ok(page) if !page.body.trim().is_empty() => SummaryResponse::Body(page.body),
            Ok(_) => {
                tracing::debug!(code, "summary body empty");
                SummaryResponse::Empty
            }
            Err(err) => match err.downcast_ref::<StatusError>() {
                Some(rejected) if !rejected.body.trim().is_empty() => {
                    tracing::debug!(code, http_status = %rejected.status, "summary rejected");
                    SummaryResponse::Rejected
                }
                _ => {
                    tracing::debug!(code, error = %err, "summary request returned no body");
                    SummaryResponse::Empty
                }
            },
        }
    }

    async fn summary(&self, code: &str) -> LocalFundamentals {
        let body = match self.summary_response(code).await {
            SummaryResponse::Body(body) => Some(body),
            SummaryResponse::Rejected => None,
            SummaryResponse::Empty => {
                tokio::time::sleep(self.empty_body_retry_delay).await;
                match self.summary_response(code).await {
                    SummaryResponse::Body(body) => Some(body),
                    _ => None,
                }
            }
        };
        body.map(|b| summary::parse(&b)).unwrap_or_default()
    }

    async fn item_page(&self, code: &str) -> Option<String> {
        let url = format!(
            "{}{}",
            self.finance_base_url.trim_end_matches('/'),
            ITEM_PAGE_PATH
        );
        match self.http.get(&url, &[("code", code)]).await {
            Ok(page) => Some(page.body),
            Err(err) => {
                tracing::warn!(code, error = %err, "item page unavailable");
                None
            }
        }
    }

    pub async fn fundamentals(&self, code: &str) -> LocalFundamentals {
        let mut found = self.summary(code).await;
        let missing = found.missing();
        if missing.is_empty() {
            return found;
        }

        tracing::debug!(code, ?missing, "filling missing fields from item page");
        let Some(body) = self.item_page(code).await else {
            return found;
        };
        let document = Html::parse_document(&body);
        for field in missing {
            found.set(field, html::extract(&document, field));
        }
        found
    }
}

#[async_trait::async_trait]
impl LocalScraper for NaverScraper {
    async fn scrape(&self, code: &str) -> MetricSet {
        let metrics = self.fundamentals(code).await.into_metric_set();
        tracing::info!(
            code,
            per = ?metrics.per,
            pbr = ?metrics.pbr,
            roe = ?metrics.roe,
            "local fundamentals scraped"
        );
        metrics
    }
}
