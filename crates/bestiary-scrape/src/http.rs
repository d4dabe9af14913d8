use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// Upper bound for a single retry wait, whether from backoff or `Retry-After`.
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

/// Wait before retry number `attempt + 1` after a transport error:
/// 1s, 2s, 4s, ... capped at `MAX_RETRY_WAIT`.
fn backoff(attempt: u32) -> Duration {
    let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_RETRY_WAIT)
}

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// Shared HTTP client: per-request timeout, optional minimum spacing between
/// requests, retries on 429 and transport errors.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(
        min_interval: Duration,
        max_retries: u32,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            let resp = self.client.get(url).send().await;
            match resp {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(5);
                    if attempt >= self.max_retries {
                        return Err(ScrapeError::RateLimit(url.to_string(), wait));
                    }
                    debug!(url, wait, "rate limited, retrying");
                    sleep(Duration::from_secs(wait).min(MAX_RETRY_WAIT)).await;
                    attempt += 1;
                }
                Ok(r) if r.status() == StatusCode::NOT_FOUND => {
                    return Err(ScrapeError::NotFound(url.to_string()));
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    return Err(ScrapeError::ApiError(
                        url.to_string(),
                        format!("HTTP {status}"),
                    ));
                }
                Ok(r) => return Ok(r),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(ScrapeError::Http(e));
                    }
                    let wait = backoff(attempt);
                    debug!(url, wait_secs = wait.as_secs(), error = %e, "transport error, retrying");
                    sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        let resp = self.send(url).await?;
        resp.text().await.map_err(ScrapeError::Http)
    }

    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.send(url).await?;
        let bytes = resp.bytes().await.map_err(ScrapeError::Http)?;
        if bytes.is_empty() {
            return Err(ScrapeError::EmptyBody(url.to_string()));
        }
        Ok(bytes.to_vec())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| ScrapeError::Parse(e.to_string()))
    }
}
