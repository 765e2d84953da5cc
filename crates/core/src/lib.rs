pub mod cascade;
pub mod domain;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod normalize;
pub mod provider;
pub mod resolve;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub finnhub_api_key: Option<String>,
        pub finnhub_base_url: Option<String>,
        pub fmp_api_key: Option<String>,
        pub fmp_base_url: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub llm_provider: Option<String>,
        pub sentry_dsn: Option<String>,
        pub naver_summary_base_url: Option<String>,
        pub naver_finance_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                finnhub_api_key: env_non_empty("FINNHUB_API_KEY"),
                finnhub_base_url: env_non_empty("FINNHUB_BASE_URL"),
                fmp_api_key: env_non_empty("FMP_API_KEY"),
                fmp_base_url: env_non_empty("FMP_BASE_URL"),
                anthropic_api_key: env_non_empty("ANTHROPIC_API_KEY"),
                openai_api_key: env_non_empty("OPENAI_API_KEY"),
                llm_provider: env_non_empty("LLM_PROVIDER"),
                sentry_dsn: env_non_empty("SENTRY_DSN"),
                naver_summary_base_url: env_non_empty("NAVER_SUMMARY_BASE_URL"),
                naver_finance_base_url: env_non_empty("NAVER_FINANCE_BASE_URL"),
            })
        }

        pub fn require_finnhub_api_key(&self) -> anyhow::Result<&str> {
            self.finnhub_api_key
                .as_deref()
                .context("FINNHUB_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }
    }

    // `.env` files often carry `KEY=` placeholders.
    fn env_non_empty(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

}
