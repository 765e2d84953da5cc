//! PER/PBR/ROE acquisition for a resolved symbol.

pub mod primary;
pub mod secondary;

use crate::domain::exchange;
use crate::domain::metrics::MetricSet;
use std::sync::Arc;

/// Structured-provider path. Never fails; missing data is `None` fields.
#[async_trait::async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> MetricSet;
}

/// Scraping path for local-exchange codes (`005930`, suffix already stripped).
#[async_trait::async_trait]
pub trait LocalScraper: Send + Sync {
    async fn scrape(&self, code: &str) -> MetricSet;
}

/// Routes a symbol to exactly one acquisition path by its exchange suffix.
pub struct MetricService {
    primary: Arc<dyn FundamentalsSource>,
    secondary: Arc<dyn LocalScraper>,
}

impl MetricService {
    pub fn new(primary: Arc<dyn FundamentalsSource>, secondary: Arc<dyn LocalScraper>) -> Self {
        Self { primary, secondary }
    }

    pub async fn get_metrics(&self, symbol: &str) -> MetricSet {
        let symbol = symbol.trim();
        let metrics = match exchange::local_code(symbol) {
            Some(code) => {
                tracing::debug!(symbol, code, "using local scraping path");
                self.secondary.scrape(code).await
            }
            None => self.primary.fetch(symbol).await,
        };

        if metrics.is_empty() {
            tracing::warn!(symbol, "no metrics available");
        }
        metrics
    }
}
