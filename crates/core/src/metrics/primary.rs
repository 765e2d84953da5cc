use crate::cascade::first_number;
use crate::domain::metrics::{derive_pbr, roe_as_percent, MetricSet};
use crate::metrics::FundamentalsSource;
use crate::provider::finnhub::FinnhubClient;
use crate::provider::fmp::FmpClient;
use serde_json::{Map, Value};

pub const PER_FIELDS: [&str; 5] = [
    "peTTM",
    "peBasicExclExtraTTM",
    "peExclExtraTTM",
    "peAnnual",
    "peNormalizedAnnual",
];
pub const PBR_FIELDS: [&str; 4] = ["pbRatioTTM", "pbQuarterly", "pbAnnual", "priceToBookAnnual"];
pub const PRICE_FIELDS: [&str; 3] = ["currentPrice", "price", "lastPrice"];
pub const BOOK_VALUE_FIELDS: [&str; 3] = [
    "bookValuePerShareQuarterly",
    "bookValuePerShareAnnual",
    "bookValuePerShare",
];
pub const ROE_FIELDS: [&str; 4] = ["roeTTM", "roeRfy", "roe5Y", "returnOnEquity"];

/// Pulls PER/PBR/ROE out of a flat fundamentals mapping.
pub fn extract(metric: &Map<String, Value>) -> MetricSet {
    let per = first_number("per", metric, &PER_FIELDS);
    let pbr = first_number("pbr", metric, &PBR_FIELDS).or_else(|| {
        derive_pbr(
            first_number("price", metric, &PRICE_FIELDS),
            first_number("bps", metric, &BOOK_VALUE_FIELDS),
        )
    });
    let roe = first_number("roe", metric, &ROE_FIELDS).map(roe_as_percent);
    MetricSet { per, pbr, roe }
}

/// Primary path: Finnhub fundamentals, with FMP as a backup ROE source when configured.
pub struct PrimaryMetricFetcher {
    finnhub: FinnhubClient,
    fmp: Option<FmpClient>,
}

impl PrimaryMetricFetcher {
    pub fn new(finnhub: FinnhubClient, fmp: Option<FmpClient>) -> Self {
        Self { finnhub, fmp }
    }
}

#[async_trait::async_trait]
impl FundamentalsSource for PrimaryMetricFetcher {
    async fn fetch(&self, symbol: &str) -> MetricSet {
        let mut metrics = match self.finnhub.fundamentals(symbol).await {
            Ok(metric) => extract(&metric),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "primary fundamentals unavailable");
                MetricSet::default()
            }
        };

        if metrics.roe.is_none() {
            if let Some(fmp) = &self.fmp {
                match fmp.return_on_equity(symbol).await {
                    Ok(roe) => metrics.roe = roe,
                    Err(err) => tracing::warn!(symbol, error = %err, "backup ROE source unavailable"),
                }
            }
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn takes_first_usable_alias() {
        let m = extract(&obj(json!({
            "peTTM": null,
            "peBasicExclExtraTTM": "N/A",
            "peAnnual": 21.5,
            "pbAnnual": 3.1,
            "roeTTM": 18.2
        })));
        assert_eq!(m.per, Some(21.5));
        assert_eq!(m.pbr, Some(3.1));
        assert_eq!(m.roe, Some(18.2));
    }

    #[test]
    fn fractional_roe_becomes_percent() {
        let m = extract(&obj(json!({"roeTTM": 0.12})));
        assert!((m.roe.unwrap() - 12.0).abs() < 1e-9);

        let m = extract(&obj(json!({"roeTTM": 12.0})));
        assert_eq!(m.roe, Some(12.0));
    }

    #[test]
    fn derives_pbr_when_missing() {
        let m = extract(&obj(json!({
            "currentPrice": 50000,
            "bookValuePerShareAnnual": "25,000"
        })));
        assert_eq!(m.pbr, Some(2.0));

        let m = extract(&obj(json!({"currentPrice": 50000, "bookValuePerShareAnnual": 0})));
        assert_eq!(m.pbr, None);
    }

    #[test]
    fn direct_pbr_wins_over_derivation() {
        let m = extract(&obj(json!({
            "pbQuarterly": 1.4,
            "currentPrice": 50000,
            "bookValuePerShareAnnual": 25000
        })));
        assert_eq!(m.pbr, Some(1.4));
    }

    #[test]
    fn empty_mapping_is_all_none() {
        assert!(extract(&Map::new()).is_empty());
    }

    #[tokio::test]
    async fn provider_failure_yields_empty_set() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stock/metric")
            .match_query(mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let finnhub =
            FinnhubClient::new(server.url(), "tok".to_string(), Duration::from_secs(5)).unwrap();
        let fetcher = PrimaryMetricFetcher::new(finnhub, None);
        assert!(fetcher.fetch("AAPL").await.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_backup_roe() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stock/metric")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!({"metric": {"peTTM": 30.2, "pbAnnual": 45.0}}).to_string())
            .create_async()
            .await;
        let fmp_mock = server
            .mock("GET", "/ratios/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(json!([{"returnOnEquity": 0.25}]).to_string())
            .expect(1)
            .create_async()
            .await;

        let finnhub =
            FinnhubClient::new(server.url(), "tok".to_string(), Duration::from_secs(5)).unwrap();
        let fmp = FmpClient::new(server.url(), "k".to_string(), Duration::from_secs(5)).unwrap();
        let m = PrimaryMetricFetcher::new(finnhub, Some(fmp)).fetch("AAPL").await;

        assert_eq!(m.per, Some(30.2));
        assert_eq!(m.pbr, Some(45.0));
        assert!((m.roe.unwrap() - 25.0).abs() < 1e-9);
        fmp_mock.assert_async().await;
    }
}
