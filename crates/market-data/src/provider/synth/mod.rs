//! Synth Finance provider implementation.
//!
//! Endpoints used:
//! - /user for the health probe
//! - /tickers/search for symbol search
//! - /tickers/{symbol} for profile data
//! - /tickers/{symbol}/open-close for daily prices
//!
//! Authentication is a bearer token. Price responses are paginated; only the
//! first page is read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::errors::MarketDataError;
use crate::models::{Price, Security, SecurityInfo, SecurityKind, DEFAULT_CURRENCY};
use crate::provider::http::HttpClient;
use crate::provider::{
    json_date, json_decimal, json_string, report_invalid_price, RetryPolicy, SecurityProvider,
};
use crate::reporting::{ErrorReporter, LogErrorReporter};

pub const BASE_URL: &str = "https://api.synthfinance.com";
pub const PROVIDER_ID: &str = "SYNTH";

const SEARCH_LIMIT: &str = "25";
const SEARCH_DATASET: &str = "limited";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /user
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Option<Value>,
}

/// Response from /tickers/search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    symbol: Option<String>,
    name: Option<String>,
    logo_url: Option<String>,
    exchange: Option<ExchangeInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ExchangeInfo {
    operating_mic_code: Option<String>,
    country_code: Option<String>,
}

/// Response from /tickers/{symbol}
#[derive(Debug, Deserialize)]
struct TickerResponse {
    data: Option<TickerData>,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    name: Option<String>,
    /// Either `["https://..."]` or `{"homepage_url": "https://..."}`
    #[serde(default)]
    links: Value,
    logo_url: Option<String>,
    description: Option<String>,
    kind: Option<String>,
}

/// Response from /tickers/{symbol}/open-close
#[derive(Debug, Deserialize)]
struct OpenCloseResponse {
    currency: Option<String>,
    exchange: Option<ExchangeInfo>,
    #[serde(default)]
    prices: Vec<Value>,
}

// ============================================================================
// SynthProvider
// ============================================================================

/// Synth Finance provider.
pub struct SynthProvider {
    http: HttpClient,
    reporter: Arc<dyn ErrorReporter>,
}

impl SynthProvider {
    /// Create a new Synth provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let present = !api_key.trim().is_empty();

        debug!(
            "Synth provider initialized with API key: {}",
            if present { "present" } else { "missing" }
        );

        let http = HttpClient::new(PROVIDER_ID, base_url)
            .with_header("Authorization", format!("Bearer {}", api_key))
            .with_header("X-Source", "maybe_app")
            .with_header("X-Source-Type", "managed")
            .with_api_key_present(present);

        Self {
            http,
            reporter: Arc::new(LogErrorReporter),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.http = self.http.with_retry(retry);
        self
    }

    /// Per-attempt request timeout (30 seconds by default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.http.retry_policy()
    }

    fn ticker_path(symbol: &str) -> String {
        format!("/tickers/{}", urlencoding::encode(symbol))
    }

    fn to_price(
        &self,
        symbol: &str,
        currency: &str,
        exchange_operating_mic: Option<&str>,
        record: &Value,
    ) -> Option<Price> {
        let date = json_date(record.get("date"));
        let price = json_decimal(record.get("close")).or_else(|| json_decimal(record.get("open")));

        match (date, price) {
            (Some(date), Some(price)) => Some(
                Price::new(symbol, date, price, currency)
                    .on_exchange(exchange_operating_mic.map(str::to_string)),
            ),
            _ => {
                report_invalid_price(self.reporter.as_ref(), PROVIDER_ID, symbol, record);
                None
            }
        }
    }
}

// ============================================================================
// SecurityProvider Implementation
// ============================================================================

#[async_trait]
impl SecurityProvider for SynthProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn healthy(&self) -> Result<bool, MarketDataError> {
        match self.http.get_json::<UserResponse>("/user", &[]).await {
            Ok(user) => Ok(match user.id {
                Some(Value::String(id)) => !id.trim().is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            }),
            Err(MarketDataError::AuthenticationFailed { .. }) => {
                error!("Synth health check failed: unauthorized");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn search_securities(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_operating_mic: Option<&str>,
    ) -> Result<Vec<Security>, MarketDataError> {
        let mut params = vec![
            ("name", symbol.to_string()),
            ("dataset", SEARCH_DATASET.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        if let Some(country) = country_code {
            params.push(("country_code", country.to_string()));
        }
        if let Some(mic) = exchange_operating_mic {
            params.push(("exchange_operating_mic", mic.to_string()));
        }

        let response: SearchResponse = self.http.get_json("/tickers/search", &params).await?;

        let results: Vec<Security> = response
            .data
            .into_iter()
            .filter_map(|item| {
                let Some(symbol) = item.symbol.filter(|s| !s.trim().is_empty()) else {
                    debug!("Synth search hit without symbol skipped: {:?}", item.name);
                    return None;
                };
                let exchange = item.exchange.unwrap_or_default();
                Some(Security {
                    symbol,
                    name: item.name,
                    logo_url: item.logo_url,
                    exchange_operating_mic: exchange.operating_mic_code,
                    country_code: exchange.country_code,
                })
            })
            .collect();

        info!("Synth search returned {} results for symbol: {}", results.len(), symbol);

        Ok(results)
    }

    async fn fetch_security_info(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
    ) -> Result<SecurityInfo, MarketDataError> {
        let mut params = Vec::new();
        if let Some(mic) = exchange_operating_mic {
            params.push(("operating_mic", mic.to_string()));
        }

        let response: TickerResponse = self
            .http
            .get_json(&Self::ticker_path(symbol), &params)
            .await?;

        let data = response.data.ok_or_else(|| MarketDataError::NotFound {
            provider: PROVIDER_ID.to_string(),
            message: format!("No ticker data found for {}", symbol),
        })?;

        Ok(SecurityInfo {
            symbol: symbol.to_string(),
            name: data.name,
            links: parse_links(&data.links),
            logo_url: data.logo_url.filter(|l| !l.trim().is_empty()),
            description: data.description,
            kind: data
                .kind
                .as_deref()
                .map(SecurityKind::from_vendor)
                .unwrap_or_default(),
            exchange_operating_mic: exchange_operating_mic.map(str::to_string),
        })
    }

    async fn fetch_security_price(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        date: NaiveDate,
    ) -> Result<Price, MarketDataError> {
        self.fetch_security_prices(symbol, exchange_operating_mic, date, date)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::NotFound {
                provider: PROVIDER_ID.to_string(),
                message: format!("No prices found for security {} on date {}", symbol, date),
            })
    }

    async fn fetch_security_prices(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Price>, MarketDataError> {
        let mut params = vec![
            ("start_date", start_date.to_string()),
            ("end_date", end_date.to_string()),
        ];
        if let Some(mic) = exchange_operating_mic {
            params.push(("operating_mic_code", mic.to_string()));
        }
        params.push(("page", "1".to_string()));

        let path = format!("{}/open-close", Self::ticker_path(symbol));
        let response: OpenCloseResponse = self.http.get_json(&path, &params).await?;

        let currency = response
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let exchange = response
            .exchange
            .and_then(|e| e.operating_mic_code)
            .or_else(|| exchange_operating_mic.map(str::to_string));

        let prices: Vec<Price> = response
            .prices
            .iter()
            .filter_map(|record| self.to_price(symbol, &currency, exchange.as_deref(), record))
            .collect();

        debug!(
            "Synth: fetched {} prices for {} ({} to {})",
            prices.len(),
            symbol,
            start_date,
            end_date
        );

        Ok(prices)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Collect links from either a list of strings or an object of named links.
fn parse_links(links: &Value) -> Vec<String> {
    match links {
        Value::Array(items) => items.iter().filter_map(|v| json_string(Some(v))).collect(),
        Value::Object(map) => map.values().filter_map(|v| json_string(Some(v))).collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
