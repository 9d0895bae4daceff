//! Shared HTTP plumbing for vendor adapters.
//!
//! Each adapter owns one [`HttpClient`]. The underlying `reqwest::Client` is
//! built lazily on the first request and reused afterwards. Timeouts are
//! retried with exponential backoff and jitter according to a
//! [`RetryPolicy`]; everything else is mapped to a [`MarketDataError`] and
//! returned to the adapter on the first attempt.

use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::errors::MarketDataError;

/// User agent sent with every vendor request.
pub const USER_AGENT: &str = "Maybe Finance App";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Exponential backoff configuration.
///
/// The delay before retry `n` (0-based) is `interval * backoff_factor^n`,
/// stretched by a random factor in `[0, interval_randomness]`.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay before the first retry.
    pub interval: Duration,

    /// Upper bound of the random stretch applied to each delay (0.5 = up to +50%).
    pub interval_randomness: f64,

    /// Multiplier applied per retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            interval: Duration::from_millis(50),
            interval_randomness: 0.5,
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry `attempt` without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt as i32);
        self.interval.mul_f64(factor)
    }

    /// Delay before retry `attempt` including jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.interval_randomness <= 0.0 {
            return base;
        }
        let stretch = rand::thread_rng().gen_range(0.0..=self.interval_randomness);
        base.mul_f64(1.0 + stretch)
    }
}

/// Lazily-built HTTP client bound to one vendor.
///
/// Not `Debug`: the default query may carry an API key.
pub(crate) struct HttpClient {
    provider: &'static str,
    base_url: String,
    headers: Vec<(&'static str, String)>,
    default_query: Vec<(&'static str, String)>,
    api_key_present: bool,
    retry: RetryPolicy,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl HttpClient {
    pub(crate) fn new(provider: &'static str, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers: Vec::new(),
            default_query: Vec::new(),
            api_key_present: false,
            retry: RetryPolicy::default(),
            timeout: REQUEST_TIMEOUT,
            client: OnceLock::new(),
        }
    }

    /// Send this header with every request.
    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Send this query parameter with every request.
    pub(crate) fn with_query_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.default_query.push((name, value.into()));
        self
    }

    /// Record whether a non-blank API key was configured. Only used in logs.
    pub(crate) fn with_api_key_present(mut self, present: bool) -> Self {
        self.api_key_present = present;
        self
    }

    pub(crate) fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-attempt request timeout. Must be set before the first request.
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn key_presence(&self) -> &'static str {
        if self.api_key_present {
            "present"
        } else {
            "missing"
        }
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(|| {
            Client::builder()
                .user_agent(USER_AGENT)
                .timeout(self.timeout)
                .build()
                .unwrap_or_else(|_| Client::new())
        })
    }

    /// GET `path` and deserialize the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let text = self.get(path, query).await?;
        serde_json::from_str(&text).map_err(|e| MarketDataError::InvalidResponse {
            provider: self.provider.to_string(),
            message: format!("Failed to parse response from {}: {}", path, e),
        })
    }

    /// GET `path`, retrying timeouts.
    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, MarketDataError> {
        let mut attempt = 0;

        loop {
            match self.send(path, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    warn!(
                        "{} request to {} failed ({}), retry {} of {} in {:?}",
                        self.provider, path, e, attempt, self.retry.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, path: &str, query: &[(&str, String)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client()
            .get(&url)
            .query(&self.default_query)
            .query(query);
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        debug!("{} request: {} with {} params", self.provider, path, query.len());

        let response = request.send().await.map_err(|e| {
            // The URL may carry the API key as a query parameter.
            let e = e.without_url();
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: self.provider.to_string(),
                }
            } else if e.is_connect() {
                MarketDataError::ServiceUnavailable {
                    provider: self.provider.to_string(),
                    message: format!("Connection failed: {}", e),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: self.provider.to_string(),
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();

        if status.is_success() {
            return response
                .text()
                .await
                .map_err(|e| MarketDataError::ProviderError {
                    provider: self.provider.to_string(),
                    message: format!("Failed to read response: {}", e.without_url()),
                });
        }

        let body = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                error!("{} API 401 Unauthorized error: {}", self.provider, body);
                error!("{} API key being used: {}", self.provider, self.key_presence());
                MarketDataError::AuthenticationFailed {
                    provider: self.provider.to_string(),
                }
            }
            StatusCode::NOT_FOUND => MarketDataError::NotFound {
                provider: self.provider.to_string(),
                message: format!("HTTP {} for {}", status, path),
            },
            StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimited {
                provider: self.provider.to_string(),
            },
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => MarketDataError::ServiceUnavailable {
                provider: self.provider.to_string(),
                message: format!("HTTP {}", status),
            },
            _ => MarketDataError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("HTTP {} - {}", status, body),
            },
        })
    }
}
