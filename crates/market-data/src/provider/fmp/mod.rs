//! Financial Modeling Prep (FMP) provider implementation.
//!
//! This module provides security data from the FMP v3 API:
//! - Symbol search via /search
//! - Company profiles via /profile/{symbol}
//! - Real-time prices via /quote/{symbol}
//! - Daily history via /historical-price-full/{symbol}
//!
//! The API key travels as the `apikey` query parameter. FMP quotes are
//! treated as USD.
//! API documentation: https://site.financialmodelingprep.com/developer/docs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
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

pub const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";
pub const PROVIDER_ID: &str = "FMP";

const SEARCH_LIMIT: &str = "25";
const HEALTH_CHECK_SYMBOL: &str = "AAPL";

// ============================================================================
// API Response Structures
// ============================================================================

/// Individual item from /search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    /// Missing on some delisted or OTC hits
    symbol: Option<String>,
    name: Option<String>,
    /// Exchange short name (e.g., "NASDAQ", "NYSE")
    exchange_short_name: Option<String>,
    /// Not always present on search results
    country: Option<String>,
}

/// Response from /profile/{symbol}
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    company_name: Option<String>,
    website: Option<String>,
    /// Logo URL
    image: Option<String>,
    description: Option<String>,
    #[serde(default)]
    is_etf: bool,
    #[serde(default)]
    is_fund: bool,
    exchange_short_name: Option<String>,
}

/// Response from /historical-price-full/{symbol}
///
/// Records stay untyped so one malformed entry can be skipped without
/// failing the whole batch.
#[derive(Debug, Default, Deserialize)]
struct HistoricalResponse {
    #[serde(default)]
    historical: Vec<Value>,
}

// ============================================================================
// FmpProvider
// ============================================================================

/// Financial Modeling Prep provider.
pub struct FmpProvider {
    http: HttpClient,
    reporter: Arc<dyn ErrorReporter>,
}

impl FmpProvider {
    /// Create a new FMP provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a provider pointed at a different host (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let present = !api_key.trim().is_empty();

        info!(
            "FMP provider initialized with API key: {}",
            if present { "present" } else { "missing" }
        );

        let http = HttpClient::new(PROVIDER_ID, base_url)
            .with_query_param("apikey", api_key)
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

    /// Send malformed-record reports to `reporter` instead of the log.
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

    fn not_found(message: String) -> MarketDataError {
        MarketDataError::NotFound {
            provider: PROVIDER_ID.to_string(),
            message,
        }
    }

    /// FMP sometimes answers 200 with `{"Error Message": "..."}`.
    fn check_error_message(data: &Value) -> Result<(), MarketDataError> {
        match json_string(data.get("Error Message")) {
            Some(message) => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    /// FMP answers single-entity endpoints with an array; take the first entry.
    fn first_entry(data: Value) -> Option<Value> {
        match data {
            Value::Array(items) => items.into_iter().next(),
            Value::Null => None,
            other => Some(other),
        }
    }

    /// Fetch the real-time price from /quote/{symbol}.
    async fn fetch_quote_price(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        date: NaiveDate,
    ) -> Result<Price, MarketDataError> {
        let path = format!("/quote/{}", urlencoding::encode(symbol));
        let data: Value = self.http.get_json(&path, &[]).await?;
        Self::check_error_message(&data)?;

        let quote = Self::first_entry(data)
            .ok_or_else(|| Self::not_found(format!("No price data found for {}", symbol)))?;

        let price = json_decimal(quote.get("price"))
            .ok_or_else(|| Self::not_found(format!("No price data found for {}", symbol)))?;

        Ok(Price::new(symbol, date, price, DEFAULT_CURRENCY)
            .on_exchange(exchange_operating_mic.map(str::to_string)))
    }

    fn to_price(&self, symbol: &str, exchange_operating_mic: Option<&str>, record: &Value) -> Option<Price> {
        let date = json_date(record.get("date"));
        let price = json_decimal(record.get("close")).or_else(|| json_decimal(record.get("adjClose")));

        match (date, price) {
            (Some(date), Some(price)) => Some(
                Price::new(symbol, date, price, DEFAULT_CURRENCY)
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
impl SecurityProvider for FmpProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn healthy(&self) -> Result<bool, MarketDataError> {
        let path = format!("/quote/{}", HEALTH_CHECK_SYMBOL);
        match self.http.get_json::<Value>(&path, &[]).await {
            Ok(Value::Array(items)) => Ok(!items.is_empty()),
            Ok(_) => Ok(false),
            Err(MarketDataError::AuthenticationFailed { .. }) => {
                error!("FMP health check failed: unauthorized");
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
        info!(
            "FMP searching for symbol: {} with API key: {}",
            symbol,
            self.http.key_presence()
        );

        let params = [
            ("query", symbol.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let items: Vec<SearchItem> = self.http.get_json("/search", &params).await?;
        info!("FMP search returned {} results for symbol: {}", items.len(), symbol);

        let matches_filter = |value: Option<&str>, filter: Option<&str>| match filter {
            None => true,
            Some(wanted) => value.is_some_and(|v| v.eq_ignore_ascii_case(wanted)),
        };

        let results: Vec<Security> = items
            .into_iter()
            .filter(|item| {
                matches_filter(item.country.as_deref(), country_code)
                    && matches_filter(item.exchange_short_name.as_deref(), exchange_operating_mic)
            })
            .filter_map(|item| {
                let Some(symbol) = item.symbol.filter(|s| !s.trim().is_empty()) else {
                    debug!("FMP search hit without symbol skipped: {:?}", item.name);
                    return None;
                };
                Some(Security {
                    symbol,
                    name: item.name,
                    // FMP search doesn't include logo URLs
                    logo_url: None,
                    exchange_operating_mic: item.exchange_short_name,
                    country_code: item.country,
                })
            })
            .collect();

        info!("FMP search filtered to {} results for symbol: {}", results.len(), symbol);

        Ok(results)
    }

    async fn fetch_security_info(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
    ) -> Result<SecurityInfo, MarketDataError> {
        debug!("Fetching security info for {} from FMP", symbol);

        let path = format!("/profile/{}", urlencoding::encode(symbol));
        let data: Value = self.http.get_json(&path, &[]).await?;
        Self::check_error_message(&data)?;

        let entry = Self::first_entry(data)
            .ok_or_else(|| Self::not_found(format!("No profile data found for {}", symbol)))?;

        let profile: ProfileResponse =
            serde_json::from_value(entry).map_err(|e| MarketDataError::InvalidSecurityInfo {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse profile for {}: {}", symbol, e),
            })?;

        if profile.company_name.is_none() {
            return Err(MarketDataError::InvalidSecurityInfo {
                provider: PROVIDER_ID.to_string(),
                message: format!("Profile for {} has no company name", symbol),
            });
        }

        let kind = determine_security_kind(&profile);
        let website = profile.website.filter(|w| !w.trim().is_empty());

        Ok(SecurityInfo {
            symbol: symbol.to_string(),
            name: profile.company_name,
            links: website.into_iter().collect(),
            logo_url: profile.image.filter(|i| !i.trim().is_empty()),
            description: profile.description,
            kind,
            exchange_operating_mic: exchange_operating_mic.map(str::to_string),
        })
    }

    async fn fetch_security_price(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        date: NaiveDate,
    ) -> Result<Price, MarketDataError> {
        debug!("Fetching price for {} on {} from FMP", symbol, date);

        if date == Utc::now().date_naive() {
            return self
                .fetch_quote_price(symbol, exchange_operating_mic, date)
                .await;
        }

        self.fetch_security_prices(symbol, exchange_operating_mic, date, date)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Self::not_found(format!(
                    "No prices found for security {} on date {}",
                    symbol, date
                ))
            })
    }

    async fn fetch_security_prices(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Price>, MarketDataError> {
        let path = format!("/historical-price-full/{}", urlencoding::encode(symbol));
        let params = [
            ("from", start_date.to_string()),
            ("to", end_date.to_string()),
        ];
        let response: HistoricalResponse = self.http.get_json(&path, &params).await?;

        let mut prices: Vec<Price> = response
            .historical
            .iter()
            .filter_map(|record| self.to_price(symbol, exchange_operating_mic, record))
            .collect();

        // FMP returns newest first
        prices.sort_by_key(|p| p.date);

        debug!(
            "FMP: fetched {} prices for {} ({} to {})",
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

/// Map an FMP profile to a security kind.
fn determine_security_kind(profile: &ProfileResponse) -> SecurityKind {
    if profile.is_etf {
        return SecurityKind::Etf;
    }

    let mutual_exchange = profile
        .exchange_short_name
        .as_deref()
        .is_some_and(|e| e.eq_ignore_ascii_case("MUTUAL"));

    if profile.is_fund || mutual_exchange {
        SecurityKind::MutualFund
    } else {
        SecurityKind::Stock
    }
}

// ============================================================================
// Tests
// ============================================================================
