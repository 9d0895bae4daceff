use async_trait::async_trait;
use chrono::NaiveDate;
use maybe_market_data::Price;

use super::securities_model::{Security, SecurityPrice};
use crate::errors::Result;

/// Trait defining the contract for the provider-backed security operations.
#[async_trait]
pub trait SecurityServiceTrait: Send + Sync {
    /// Search the primary provider, falling back to the secondary one.
    /// Never fails: provider errors yield an empty list.
    async fn search_provider(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_operating_mic: Option<&str>,
    ) -> Vec<Security>;

    /// Cached price for `date` (today when `None`), else the first provider
    /// that has one. `Ok(None)` when every provider failed.
    async fn find_or_fetch_price(
        &self,
        security: &Security,
        date: Option<NaiveDate>,
        cache: bool,
    ) -> Result<Option<Price>>;

    /// Fill in name and logo from the first provider that has a profile.
    async fn import_provider_details(&self, security: &mut Security, clear_cache: bool)
        -> Result<()>;

    /// Import daily prices from the first provider that yields any.
    /// Returns the number of rows written.
    async fn import_provider_prices(
        &self,
        security: &Security,
        start_date: NaiveDate,
        end_date: NaiveDate,
        clear_cache: bool,
    ) -> Result<usize>;
}

/// Trait defining the contract for Security repository operations.
#[async_trait]
pub trait SecurityRepositoryTrait: Send + Sync {
    /// Overwrite the display fields of a stored security.
    async fn update_details(
        &self,
        security_id: &str,
        name: Option<String>,
        logo_url: Option<String>,
    ) -> Result<Security>;
}

/// Trait defining the contract for the security price cache.
#[async_trait]
pub trait SecurityPriceRepositoryTrait: Send + Sync {
    fn find_price(&self, security_id: &str, date: NaiveDate) -> Result<Option<SecurityPrice>>;

    /// Cached rows with `start_date <= date <= end_date`, any order.
    fn prices_in_range(
        &self,
        security_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<SecurityPrice>>;

    /// Most recent cached row strictly before `date`.
    fn latest_price_before(
        &self,
        security_id: &str,
        date: NaiveDate,
    ) -> Result<Option<SecurityPrice>>;

    /// Return the existing row for `(security_id, date)` or insert `price`.
    async fn find_or_create_price(&self, price: SecurityPrice) -> Result<SecurityPrice>;

    /// Insert or replace rows keyed by `(security_id, date)`.
    async fn upsert_prices(&self, prices: &[SecurityPrice]) -> Result<usize>;
}
