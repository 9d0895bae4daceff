use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use maybe_market_data::{
    ErrorReport, ErrorReporter, LogErrorReporter, Price, SecurityProvider,
};
use serde_json::json;

use super::price_importer::{cached_range_complete, PriceImporter};
use super::securities_constants::{SECURITY_INFO_MISSING_ERROR, SECURITY_INFO_MISSING_MESSAGE};
use super::securities_model::{Security, SecurityPrice};
use super::securities_traits::{
    SecurityPriceRepositoryTrait, SecurityRepositoryTrait, SecurityServiceTrait,
};
use crate::errors::{Error, Result};
use crate::providers::{ProviderKey, SecurityProviderRegistry};

/// Coordinates the securities providers: primary first, fallback second.
#[derive(Clone)]
pub struct SecurityService {
    registry: Arc<SecurityProviderRegistry>,
    security_repository: Arc<dyn SecurityRepositoryTrait>,
    price_repository: Arc<dyn SecurityPriceRepositoryTrait>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SecurityService {
    pub fn new(
        registry: Arc<SecurityProviderRegistry>,
        security_repository: Arc<dyn SecurityRepositoryTrait>,
        price_repository: Arc<dyn SecurityPriceRepositoryTrait>,
    ) -> Self {
        Self {
            registry,
            security_repository,
            price_repository,
            reporter: Arc::new(LogErrorReporter),
        }
    }

    /// Sets the error reporter for this service.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn primary_provider(&self) -> Option<Arc<dyn SecurityProvider>> {
        self.registry.get_provider(ProviderKey::Synth)
    }

    pub fn fallback_provider(&self) -> Option<Arc<dyn SecurityProvider>> {
        self.registry.get_provider(ProviderKey::Fmp)
    }

    /// Configured providers in the order they are tried.
    pub fn available_providers(&self) -> Vec<Arc<dyn SecurityProvider>> {
        [self.primary_provider(), self.fallback_provider()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Drops whitespace-only values. Kept values are passed on as given.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl SecurityServiceTrait for SecurityService {
    async fn search_provider(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_operating_mic: Option<&str>,
    ) -> Vec<Security> {
        if symbol.trim().is_empty() {
            return Vec::new();
        }

        let country_code = non_blank(country_code);
        let exchange_operating_mic = non_blank(exchange_operating_mic);

        if let Some(primary) = self.primary_provider() {
            match primary
                .search_securities(symbol, country_code, exchange_operating_mic)
                .await
            {
                Ok(results) if !results.is_empty() => {
                    return results.into_iter().map(Security::from).collect();
                }
                Ok(_) => info!(
                    "{} returned no results for {}, trying fallback",
                    primary.id(),
                    symbol
                ),
                Err(e) => warn!("{} search failed for {}: {}", primary.id(), symbol, e),
            }
        }

        if let Some(fallback) = self.fallback_provider() {
            match fallback
                .search_securities(symbol, country_code, exchange_operating_mic)
                .await
            {
                Ok(results) => return results.into_iter().map(Security::from).collect(),
                Err(e) => warn!("{} search failed for {}: {}", fallback.id(), symbol, e),
            }
        }

        Vec::new()
    }

    async fn find_or_fetch_price(
        &self,
        security: &Security,
        date: Option<NaiveDate>,
        cache: bool,
    ) -> Result<Option<Price>> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        if let Some(cached) = self.price_repository.find_price(&security.id, date)? {
            return Ok(Some(cached.to_price(security)));
        }

        for provider in self.available_providers() {
            let price = match provider
                .fetch_security_price(
                    &security.ticker,
                    security.exchange_operating_mic.as_deref(),
                    date,
                )
                .await
            {
                Ok(price) => price,
                Err(e) => {
                    debug!(
                        "{} has no price for {} on {}: {}",
                        provider.id(),
                        security.ticker,
                        date,
                        e
                    );
                    continue;
                }
            };

            if cache {
                self.price_repository
                    .find_or_create_price(SecurityPrice::from_provider(&security.id, &price))
                    .await?;
            }
            return Ok(Some(price));
        }

        Ok(None)
    }

    async fn import_provider_details(
        &self,
        security: &mut Security,
        clear_cache: bool,
    ) -> Result<()> {
        if security.has_provider_details() && !clear_cache {
            return Ok(());
        }

        for provider in self.available_providers() {
            match provider
                .fetch_security_info(&security.ticker, security.exchange_operating_mic.as_deref())
                .await
            {
                Ok(info) => {
                    let updated = self
                        .security_repository
                        .update_details(&security.id, info.name, info.logo_url)
                        .await?;
                    security.name = updated.name;
                    security.logo_url = updated.logo_url;
                    return Ok(());
                }
                Err(e) => warn!(
                    "Failed to fetch security info for {} from {}: {}",
                    security.ticker,
                    provider.id(),
                    e
                ),
            }
        }

        let error = Error::SecurityInfoMissing(SECURITY_INFO_MISSING_MESSAGE.to_string());
        self.reporter.capture(
            ErrorReport::warning(SECURITY_INFO_MISSING_ERROR, error.to_string())
                .tag("security_id", security.id.clone())
                .context(
                    "security",
                    json!({ "id": security.id, "ticker": security.ticker }),
                ),
        );

        Ok(())
    }

    async fn import_provider_prices(
        &self,
        security: &Security,
        start_date: NaiveDate,
        end_date: NaiveDate,
        clear_cache: bool,
    ) -> Result<usize> {
        if start_date > end_date {
            return Err(Error::Validation(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            )));
        }

        if !clear_cache
            && cached_range_complete(
                self.price_repository.as_ref(),
                &security.id,
                start_date,
                end_date,
            )?
        {
            info!(
                "Prices for {} between {} and {} are already cached",
                security.ticker, start_date, end_date
            );
            return Ok(0);
        }

        for provider in self.available_providers() {
            let imported = PriceImporter::new(
                security.clone(),
                provider.clone(),
                self.price_repository.clone(),
                start_date,
                end_date,
            )
            .clear_cache(clear_cache)
            .import_provider_prices()
            .await?;

            if imported > 0 {
                return Ok(imported);
            }

            warn!(
                "Provider {} failed to import prices for {}",
                provider.id(),
                security.ticker
            );
        }

        warn!("All providers failed to import prices for {}", security.ticker);
        Ok(0)
    }
}
