//! Security provider trait definitions.
//!
//! This module defines the `SecurityProvider` trait that every vendor
//! adapter implements. The fallback coordinator only ever talks to vendors
//! through this trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{Price, Security, SecurityInfo};

/// Trait for security data vendors.
///
/// Implement this trait to add a new vendor. All operations perform a single
/// HTTP request (plus timeout retries) and return `Err` for anything the
/// caller should treat as "try the next provider".
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use maybe_market_data::provider::SecurityProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl SecurityProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     // ... implement search and price methods
/// }
/// ```
#[async_trait]
pub trait SecurityProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "SYNTH" or "FMP".
    /// Used for logging and error attribution.
    fn id(&self) -> &'static str;

    /// Cheap authenticated probe.
    ///
    /// Returns `Ok(false)` when the vendor answers but rejects the API key
    /// or returns nothing useful.
    async fn healthy(&self) -> Result<bool, MarketDataError>;

    /// Search for securities matching `symbol`.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Ticker or name fragment (e.g., "AAPL", "Apple")
    /// * `country_code` - Optional ISO 3166-1 alpha-2 filter
    /// * `exchange_operating_mic` - Optional exchange filter
    async fn search_securities(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_operating_mic: Option<&str>,
    ) -> Result<Vec<Security>, MarketDataError>;

    /// Fetch profile information for a security.
    async fn fetch_security_info(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
    ) -> Result<SecurityInfo, MarketDataError>;

    /// Fetch the price of a security on a single date.
    async fn fetch_security_price(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        date: NaiveDate,
    ) -> Result<Price, MarketDataError>;

    /// Fetch daily prices for a security between `start_date` and `end_date`
    /// (both inclusive).
    ///
    /// Malformed individual records are skipped and reported; they never
    /// fail the batch.
    async fn fetch_security_prices(
        &self,
        symbol: &str,
        exchange_operating_mic: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Price>, MarketDataError>;
}
