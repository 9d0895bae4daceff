//! Imports one provider's daily prices into the price cache.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};
use maybe_market_data::{Price, SecurityProvider, DEFAULT_CURRENCY};
use rust_decimal::Decimal;

use super::securities_model::{Security, SecurityPrice};
use super::securities_traits::SecurityPriceRepositoryTrait;
use crate::errors::{Error, Result};

/// Whether the cache already holds a row for every day in `[start_date, end_date]`.
pub fn cached_range_complete(
    repository: &dyn SecurityPriceRepositoryTrait,
    security_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<bool> {
    if start_date > end_date {
        return Ok(false);
    }
    let expected = (end_date - start_date).num_days() + 1;
    let cached: HashSet<NaiveDate> = repository
        .prices_in_range(security_id, start_date, end_date)?
        .into_iter()
        .map(|row| row.date)
        .filter(|date| *date >= start_date && *date <= end_date)
        .collect();
    Ok(cached.len() as i64 == expected)
}

/// Builds one cache row per calendar day from a single provider.
///
/// For each day the cached price wins over the provider price unless
/// `clear_cache` is set. Days with neither carry the previous day's price
/// forward, starting from the latest cached row before `start_date`. Days
/// before any known price are left out.
pub struct PriceImporter {
    security: Security,
    provider: Arc<dyn SecurityProvider>,
    repository: Arc<dyn SecurityPriceRepositoryTrait>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    clear_cache: bool,
}

impl PriceImporter {
    pub fn new(
        security: Security,
        provider: Arc<dyn SecurityProvider>,
        repository: Arc<dyn SecurityPriceRepositoryTrait>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            security,
            provider,
            repository,
            start_date,
            end_date,
            clear_cache: false,
        }
    }

    /// Prefer provider prices over cached ones.
    pub fn clear_cache(mut self, clear_cache: bool) -> Self {
        self.clear_cache = clear_cache;
        self
    }

    /// Fetch, merge and upsert. Returns the number of rows written.
    ///
    /// A provider failure is logged and counts as zero imported rows.
    pub async fn import_provider_prices(&self) -> Result<usize> {
        if self.start_date > self.end_date {
            return Err(Error::Validation(format!(
                "Start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }

        let ticker = &self.security.ticker;
        let provider_prices = match self
            .provider
            .fetch_security_prices(
                ticker,
                self.security.exchange_operating_mic.as_deref(),
                self.start_date,
                self.end_date,
            )
            .await
        {
            Ok(prices) => prices,
            Err(e) => {
                warn!(
                    "Failed to fetch prices for {} from {}: {}",
                    ticker,
                    self.provider.id(),
                    e
                );
                return Ok(0);
            }
        };

        if provider_prices.is_empty() {
            warn!(
                "{} returned no prices for {} between {} and {}",
                self.provider.id(),
                ticker,
                self.start_date,
                self.end_date
            );
            return Ok(0);
        }

        let cached = self.repository.prices_in_range(
            &self.security.id,
            self.start_date,
            self.end_date,
        )?;

        let seed = self
            .repository
            .latest_price_before(&self.security.id, self.start_date)?;

        let rows = self.build_rows(provider_prices, cached, seed);
        if rows.is_empty() {
            return Ok(0);
        }

        debug!(
            "Upserting {} prices for {} from {}",
            rows.len(),
            ticker,
            self.provider.id()
        );

        self.repository.upsert_prices(&rows).await
    }

    fn build_rows(
        &self,
        provider_prices: Vec<Price>,
        cached: Vec<SecurityPrice>,
        seed: Option<SecurityPrice>,
    ) -> Vec<SecurityPrice> {
        let provided: HashMap<NaiveDate, Price> = provider_prices
            .into_iter()
            .map(|price| (price.date, price))
            .collect();
        let cached: HashMap<NaiveDate, SecurityPrice> =
            cached.into_iter().map(|row| (row.date, row)).collect();

        let mut rows = Vec::new();
        let mut previous: Option<(Decimal, String)> = seed
            .filter(|row| row.date < self.start_date)
            .map(|row| (row.price, row.currency));

        for date in self
            .start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
        {
            let cached_row = cached.get(&date);
            let provided_row = provided.get(&date);

            let cached_price = cached_row.map(|row| row.price);
            let provided_price = provided_row.map(|price| price.price);

            let chosen = if self.clear_cache {
                provided_price.or(cached_price)
            } else {
                cached_price.or(provided_price)
            };

            let Some(price) = chosen.or_else(|| previous.as_ref().map(|(price, _)| *price)) else {
                continue;
            };

            let currency = provided_row
                .map(|price| price.currency.clone())
                .or_else(|| previous.as_ref().map(|(_, currency)| currency.clone()))
                .or_else(|| cached_row.map(|row| row.currency.clone()))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

            rows.push(SecurityPrice {
                security_id: self.security.id.clone(),
                date,
                price,
                currency: currency.clone(),
            });
            previous = Some((price, currency));
        }

        rows
    }
}
