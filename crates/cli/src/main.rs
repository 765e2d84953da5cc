use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use stockquest_core::config::Settings;
use stockquest_core::domain::candidate::ResolvedTicker;
use stockquest_core::domain::exchange;
use stockquest_core::domain::metrics::MetricSet;
use stockquest_core::error::TransliterationError;
use stockquest_core::metrics::primary::PrimaryMetricFetcher;
use stockquest_core::metrics::secondary::NaverScraper;
use stockquest_core::metrics::{FundamentalsSource, MetricService};
use stockquest_core::provider::finnhub::FinnhubClient;
use stockquest_core::provider::fmp::FmpClient;
use stockquest_core::resolve::cache::CandidateCache;
use stockquest_core::resolve::transliterate::{LlmTransliterator, Transliterator};
use stockquest_core::resolve::TickerResolver;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stockquest", about = "Company name to ticker and PER/PBR/ROE")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a company name (any script) or 6-digit code to a ticker.
    Resolve { text: String },
    /// Fetch PER/PBR/ROE for a ticker symbol.
    Metrics { symbol: String },
    /// Resolve, then fetch metrics; fails when none of the three ratios is available.
    Lookup { text: String },
}

#[derive(Debug, Serialize)]
struct Lookup {
    #[serde(flatten)]
    ticker: ResolvedTicker,
    metrics: MetricSet,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let result = run(&settings, args.command).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    result
}

async fn run(settings: &Settings, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Resolve { text } => {
            let ticker = build_resolver(settings)?.resolve(&text).await?;
            print_json(&ticker)
        }
        Command::Metrics { symbol } => {
            let metrics = build_metric_service(settings, &symbol)?
                .get_metrics(&symbol)
                .await;
            print_json(&metrics)
        }
        Command::Lookup { text } => {
            let ticker = build_resolver(settings)?.resolve(&text).await?;
            let metrics = build_metric_service(settings, &ticker.symbol)?
                .get_metrics(&ticker.symbol)
                .await
                .require_any(&ticker.symbol)?;
            print_json(&Lookup { ticker, metrics })
        }
    }
}

fn build_resolver(settings: &Settings) -> anyhow::Result<TickerResolver> {
    let search = Arc::new(FinnhubClient::from_settings(settings)?);
    let cache = Arc::new(CandidateCache::from_env(search));

    let transliterator: Arc<dyn Transliterator> = match stockquest_core::llm::from_settings(settings) {
        Ok(llm) => Arc::new(LlmTransliterator::new(llm)),
        Err(err) => {
            // Latin-script input never needs the model.
            tracing::warn!(error = %err, "no text generation backend configured");
            Arc::new(Unconfigured(format!("{err:#}")))
        }
    };

    Ok(TickerResolver::new(transliterator, cache))
}

/// Local-exchange symbols never reach the primary provider, so its key is only
/// required for the others.
fn build_metric_service(settings: &Settings, symbol: &str) -> anyhow::Result<MetricService> {
    let primary: Arc<dyn FundamentalsSource> = match FinnhubClient::from_settings(settings) {
        Ok(finnhub) => Arc::new(PrimaryMetricFetcher::new(
            finnhub,
            FmpClient::from_settings(settings)?,
        )),
        Err(err) if exchange::is_local_symbol(symbol) => {
            tracing::debug!(symbol, error = %err, "primary provider not configured");
            Arc::new(NoPrimary)
        }
        Err(err) => return Err(err),
    };
    let scraper = NaverScraper::from_settings(settings)?;
    Ok(MetricService::new(primary, Arc::new(scraper)))
}

struct NoPrimary;

#[async_trait::async_trait]
impl FundamentalsSource for NoPrimary {
    async fn fetch(&self, _symbol: &str) -> MetricSet {
        MetricSet::default()
    }
}

struct Unconfigured(String);

#[async_trait::async_trait]
impl Transliterator for Unconfigured {
    async fn to_latin(&self, _name: &str) -> Result<String, TransliterationError> {
        Err(TransliterationError::Unavailable(anyhow::anyhow!(self.0.clone())))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
