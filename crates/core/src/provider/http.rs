use anyhow::{Context, Result};
use encoding_rs::{Encoding, EUC_KR, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A decoded response body.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    pub body: String,
}

/// Final non-success response, body included. Downcast from the `anyhow::Error` of [`RetryingClient::get`].
#[derive(Debug, thiserror::Error)]
#[error("GET {url} returned HTTP {status}")]
pub struct StatusError {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

/// GET-only client with bounded retry on transient failures.
///
/// Retries connect/timeout errors, HTTP 429 and 5xx, up to `max_attempts` total attempts
/// with `base_backoff * 2^(attempt-1)` between them. Only idempotent reads go through here.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    http: reqwest::Client,
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryingClient {
    pub fn new(timeout: Duration, max_attempts: u32, base_backoff: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build scraper http client")?;

        Ok(Self {
            http,
            max_attempts: max_attempts.max(1),
            base_backoff,
        })
    }

    /// Fetches `url` and decodes the body. Non-success statuses that are not retried are errors.
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Page> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let res = self.http.get(url).query(query).send().await;
            let res = match res {
                Ok(r) => r,
                Err(err) => {
                    let transient = err.is_timeout() || err.is_connect();
                    if !transient || attempt >= self.max_attempts {
                        return Err(err).with_context(|| format!("GET {url} failed"));
                    }
                    let backoff = self.backoff(attempt);
                    tracing::warn!(attempt, ?backoff, %url, error = %err, "request failed; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            if !status.is_success() {
                let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if retryable && attempt < self.max_attempts {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(attempt, ?backoff, %url, http_status = %status, "HTTP error; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                let body = read_body(res, url).await.unwrap_or_default();
                return Err(StatusError {
                    url: url.to_string(),
                    status,
                    body,
                }
                .into());
            }

            return Ok(Page {
                status,
                body: read_body(res, url).await?,
            });
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * (1u32 << (attempt - 1).min(16))
    }
}

async fn read_body(res: reqwest::Response, url: &str) -> Result<String> {
    let charset = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_label)
        .map(str::to_string);
    let bytes = res
        .bytes()
        .await
        .with_context(|| format!("failed to read body of {url}"))?;
    Ok(decode_body(&bytes, charset.as_deref()))
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (k, v) = part.split_once('=')?;
        k.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| v.trim().trim_matches('"'))
    })
}

/// Decodes with the declared charset; otherwise UTF-8, falling back to EUC-KR.
pub fn decode_body(bytes: &[u8], charset: Option<&str>) -> String {
    if let Some(encoding) = charset.and_then(|l| Encoding::for_label(l.as_bytes())) {
        let (text, _, _) = encoding.decode(bytes);
        return text.into_owned();
    }

    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    let (text, _, _) = EUC_KR.decode(bytes);
    text.into_owned()
}
