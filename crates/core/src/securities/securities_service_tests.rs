//! Tests for SecurityService fallback ordering and PriceImporter gap filling.
//!
//! Providers are mocks that return canned data or fail, repositories are
//! in-memory. No network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use maybe_market_data::{
    self as market_data, MarketDataError, MockErrorReporter, Price, ReportLevel, SecurityInfo,
    SecurityKind, SecurityProvider,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{Error, Result};
use crate::providers::{ProviderKey, SecurityProviderRegistry};

// =========================================================================
// Mock provider
// =========================================================================

struct MockProvider {
    id: &'static str,
    search_results: Option<Vec<market_data::Security>>,
    info: Option<SecurityInfo>,
    price: Option<Price>,
    prices: Option<Vec<Price>>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    /// A provider whose every operation fails.
    fn failing(id: &'static str) -> Self {
        Self {
            id,
            search_results: None,
            info: None,
            price: None,
            prices: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_search(mut self, results: Vec<market_data::Security>) -> Self {
        self.search_results = Some(results);
        self
    }

    fn with_info(mut self, name: &str, logo_url: &str) -> Self {
        self.info = Some(SecurityInfo {
            symbol: "AAPL".to_string(),
            name: Some(name.to_string()),
            links: vec![],
            logo_url: Some(logo_url.to_string()),
            description: None,
            kind: SecurityKind::Stock,
            exchange_operating_mic: None,
        });
        self
    }

    fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    fn with_prices(mut self, prices: Vec<Price>) -> Self {
        self.prices = Some(prices);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(&self) -> MarketDataError {
        MarketDataError::ProviderError {
            provider: self.id.to_string(),
            message: "mock failure".to_string(),
        }
    }
}

#[async_trait]
impl SecurityProvider for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn healthy(&self) -> std::result::Result<bool, MarketDataError> {
        Ok(true)
    }

    async fn search_securities(
        &self,
        symbol: &str,
        country_code: Option<&str>,
        exchange_operating_mic: Option<&str>,
    ) -> std::result::Result<Vec<market_data::Security>, MarketDataError> {
        self.record(format!(
            "search:{}:{:?}:{:?}",
            symbol, country_code, exchange_operating_mic
        ));
        self.search_results.clone().ok_or_else(|| self.failure())
    }

    async fn fetch_security_info(
        &self,
        symbol: &str,
        _exchange_operating_mic: Option<&str>,
    ) -> std::result::Result<SecurityInfo, MarketDataError> {
        self.record(format!("info:{}", symbol));
        self.info.clone().ok_or_else(|| self.failure())
    }

    async fn fetch_security_price(
        &self,
        symbol: &str,
        _exchange_operating_mic: Option<&str>,
        date: NaiveDate,
    ) -> std::result::Result<Price, MarketDataError> {
        self.record(format!("price:{}:{}", symbol, date));
        self.price.clone().ok_or_else(|| self.failure())
    }

    async fn fetch_security_prices(
        &self,
        symbol: &str,
        _exchange_operating_mic: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> std::result::Result<Vec<Price>, MarketDataError> {
        self.record(format!("prices:{}:{}:{}", symbol, start_date, end_date));
        self.prices.clone().ok_or_else(|| self.failure())
    }
}

// =========================================================================
// In-memory repositories
// =========================================================================

#[derive(Default)]
struct InMemorySecurityRepository {
    securities: Mutex<HashMap<String, Security>>,
}

#[async_trait]
impl SecurityRepositoryTrait for InMemorySecurityRepository {
    async fn update_details(
        &self,
        security_id: &str,
        name: Option<String>,
        logo_url: Option<String>,
    ) -> Result<Security> {
        let mut securities = self.securities.lock().unwrap();
        let security = securities
            .entry(security_id.to_string())
            .or_insert_with(|| Security::new(security_id, ""));
        security.name = name;
        security.logo_url = logo_url;
        Ok(security.clone())
    }
}

#[derive(Default)]
struct InMemoryPriceRepository {
    rows: Mutex<Vec<SecurityPrice>>,
    upsert_calls: Mutex<usize>,
}

impl InMemoryPriceRepository {
    fn with_rows(rows: Vec<SecurityPrice>) -> Self {
        Self {
            rows: Mutex::new(rows),
            upsert_calls: Mutex::new(0),
        }
    }

    fn rows(&self) -> Vec<SecurityPrice> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|r| r.date);
        rows
    }

    fn upsert_calls(&self) -> usize {
        *self.upsert_calls.lock().unwrap()
    }
}

#[async_trait]
impl SecurityPriceRepositoryTrait for InMemoryPriceRepository {
    fn find_price(&self, security_id: &str, date: NaiveDate) -> Result<Option<SecurityPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.security_id == security_id && r.date == date)
            .cloned())
    }

    fn prices_in_range(
        &self,
        security_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<SecurityPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.security_id == security_id && r.date >= start_date && r.date <= end_date)
            .cloned()
            .collect())
    }

    fn latest_price_before(
        &self,
        security_id: &str,
        date: NaiveDate,
    ) -> Result<Option<SecurityPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.security_id == security_id && r.date < date)
            .max_by_key(|r| r.date)
            .cloned())
    }

    async fn find_or_create_price(&self, price: SecurityPrice) -> Result<SecurityPrice> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter()
            .find(|r| r.security_id == price.security_id && r.date == price.date)
        {
            return Ok(existing.clone());
        }
        rows.push(price.clone());
        Ok(price)
    }

    async fn upsert_prices(&self, prices: &[SecurityPrice]) -> Result<usize> {
        *self.upsert_calls.lock().unwrap() += 1;
        let mut rows = self.rows.lock().unwrap();
        for price in prices {
            rows.retain(|r| !(r.security_id == price.security_id && r.date == price.date));
            rows.push(price.clone());
        }
        Ok(prices.len())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn price(d: NaiveDate, value: Decimal, currency: &str) -> Price {
    Price::new("AAPL", d, value, currency)
}

fn row(d: NaiveDate, value: Decimal, currency: &str) -> SecurityPrice {
    SecurityPrice {
        security_id: "sec-1".to_string(),
        date: d,
        price: value,
        currency: currency.to_string(),
    }
}

fn aapl() -> Security {
    let mut security = Security::new("sec-1", "AAPL");
    security.exchange_operating_mic = Some("XNAS".to_string());
    security
}

struct Fixture {
    service: SecurityService,
    prices: Arc<InMemoryPriceRepository>,
    reporter: MockErrorReporter,
}

fn fixture(
    synth: Option<Arc<MockProvider>>,
    fmp: Option<Arc<MockProvider>>,
    prices: InMemoryPriceRepository,
) -> Fixture {
    let mut entries: Vec<(ProviderKey, Arc<dyn SecurityProvider>)> = Vec::new();
    if let Some(p) = synth {
        entries.push((ProviderKey::Synth, p as Arc<dyn SecurityProvider>));
    }
    if let Some(p) = fmp {
        entries.push((ProviderKey::Fmp, p as Arc<dyn SecurityProvider>));
    }

    let prices = Arc::new(prices);
    let reporter = MockErrorReporter::new();
    let service = SecurityService::new(
        Arc::new(SecurityProviderRegistry::from_providers(entries)),
        Arc::new(InMemorySecurityRepository::default()),
        prices.clone(),
    )
    .with_error_reporter(Arc::new(reporter.clone()));

    Fixture {
        service,
        prices,
        reporter,
    }
}

// =========================================================================
// Provider selection
// =========================================================================

#[test]
fn test_primary_and_fallback_providers() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let fmp = Arc::new(MockProvider::failing("FMP"));
    // Registered out of order on purpose
    let registry = SecurityProviderRegistry::from_providers(vec![
        (ProviderKey::Fmp, fmp as Arc<dyn SecurityProvider>),
        (ProviderKey::Synth, synth as Arc<dyn SecurityProvider>),
    ]);
    let service = SecurityService::new(
        Arc::new(registry),
        Arc::new(InMemorySecurityRepository::default()),
        Arc::new(InMemoryPriceRepository::default()),
    );

    assert_eq!(service.primary_provider().unwrap().id(), "SYNTH");
    assert_eq!(service.fallback_provider().unwrap().id(), "FMP");
    let ids: Vec<&str> = service.available_providers().iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["SYNTH", "FMP"]);
}

#[test]
fn test_available_providers_skips_unconfigured() {
    let f = fixture(
        None,
        Some(Arc::new(MockProvider::failing("FMP"))),
        InMemoryPriceRepository::default(),
    );

    assert!(f.service.primary_provider().is_none());
    let ids: Vec<&str> = f.service.available_providers().iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["FMP"]);
}

// =========================================================================
// search_provider
// =========================================================================

#[tokio::test]
async fn test_search_blank_symbol_makes_no_calls() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    assert!(f.service.search_provider("  ", None, None).await.is_empty());
    assert!(synth.calls().is_empty());
}

#[tokio::test]
async fn test_search_uses_primary_when_it_has_results() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH")
            .with_search(vec![market_data::Security::new("AAPL").name("Apple Inc.")]),
    );
    let fmp = Arc::new(MockProvider::failing("FMP").with_search(vec![]));
    let f = fixture(Some(synth.clone()), Some(fmp.clone()), InMemoryPriceRepository::default());

    let results = f.service.search_provider("AAPL", None, None).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ticker, "AAPL");
    assert_eq!(results[0].id, "");
    assert!(fmp.calls().is_empty());
}

#[tokio::test]
async fn test_search_falls_back_when_primary_is_empty() {
    let synth = Arc::new(MockProvider::failing("SYNTH").with_search(vec![]));
    let fmp = Arc::new(
        MockProvider::failing("FMP").with_search(vec![market_data::Security::new("AAPL")]),
    );
    let f = fixture(Some(synth.clone()), Some(fmp.clone()), InMemoryPriceRepository::default());

    let results = f.service.search_provider("AAPL", None, None).await;

    assert_eq!(results.len(), 1);
    assert_eq!(synth.calls().len(), 1);
    assert_eq!(fmp.calls().len(), 1);
}

#[tokio::test]
async fn test_search_falls_back_when_primary_fails() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let fmp = Arc::new(MockProvider::failing("FMP").with_search(vec![]));
    let f = fixture(Some(synth), Some(fmp.clone()), InMemoryPriceRepository::default());

    // Fallback success with zero results is still the answer
    let results = f.service.search_provider("ZZZZ", None, None).await;

    assert!(results.is_empty());
    assert_eq!(fmp.calls().len(), 1);
}

#[tokio::test]
async fn test_search_all_failing_is_empty() {
    let f = fixture(
        Some(Arc::new(MockProvider::failing("SYNTH"))),
        Some(Arc::new(MockProvider::failing("FMP"))),
        InMemoryPriceRepository::default(),
    );

    assert!(f.service.search_provider("AAPL", None, None).await.is_empty());
}

#[tokio::test]
async fn test_search_drops_blank_filters() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH").with_search(vec![market_data::Security::new("AAPL")]),
    );
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    f.service
        .search_provider("AAPL", Some(" "), Some("XNAS"))
        .await;

    assert_eq!(synth.calls(), vec!["search:AAPL:None:Some(\"XNAS\")"]);
}

#[tokio::test]
async fn test_search_passes_symbol_through_untrimmed() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH").with_search(vec![market_data::Security::new("BRK B")]),
    );
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    let results = f.service.search_provider(" BRK B ", None, None).await;

    assert_eq!(results.len(), 1);
    assert_eq!(synth.calls(), vec!["search: BRK B :None:None"]);
}

// =========================================================================
// find_or_fetch_price
// =========================================================================

#[tokio::test]
async fn test_find_or_fetch_price_returns_cached_price() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let f = fixture(
        Some(synth.clone()),
        None,
        InMemoryPriceRepository::with_rows(vec![row(date(2024, 1, 2), dec!(185.64), "USD")]),
    );

    let found = f
        .service
        .find_or_fetch_price(&aapl(), Some(date(2024, 1, 2)), true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.price, dec!(185.64));
    assert_eq!(found.symbol, "AAPL");
    assert_eq!(found.exchange_operating_mic.as_deref(), Some("XNAS"));
    assert!(synth.calls().is_empty());
}

#[tokio::test]
async fn test_find_or_fetch_price_falls_back_and_caches() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let fmp = Arc::new(
        MockProvider::failing("FMP").with_price(price(date(2024, 1, 2), dec!(185.64), "USD")),
    );
    let f = fixture(Some(synth.clone()), Some(fmp), InMemoryPriceRepository::default());

    let found = f
        .service
        .find_or_fetch_price(&aapl(), Some(date(2024, 1, 2)), true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.price, dec!(185.64));
    assert_eq!(synth.calls(), vec!["price:AAPL:2024-01-02"]);
    assert_eq!(f.prices.rows(), vec![row(date(2024, 1, 2), dec!(185.64), "USD")]);
}

#[tokio::test]
async fn test_find_or_fetch_price_without_cache_does_not_persist() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH").with_price(price(date(2024, 1, 2), dec!(185.64), "USD")),
    );
    let f = fixture(Some(synth), None, InMemoryPriceRepository::default());

    let found = f
        .service
        .find_or_fetch_price(&aapl(), Some(date(2024, 1, 2)), false)
        .await
        .unwrap();

    assert!(found.is_some());
    assert!(f.prices.rows().is_empty());
}

#[tokio::test]
async fn test_find_or_fetch_price_defaults_to_today() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    let found = f.service.find_or_fetch_price(&aapl(), None, true).await.unwrap();

    assert!(found.is_none());
    let today = Utc::now().date_naive();
    assert_eq!(synth.calls(), vec![format!("price:AAPL:{}", today)]);
}

#[tokio::test]
async fn test_find_or_fetch_price_all_failing_is_none() {
    let f = fixture(
        Some(Arc::new(MockProvider::failing("SYNTH"))),
        Some(Arc::new(MockProvider::failing("FMP"))),
        InMemoryPriceRepository::default(),
    );

    let found = f
        .service
        .find_or_fetch_price(&aapl(), Some(date(2024, 1, 2)), true)
        .await
        .unwrap();

    assert!(found.is_none());
}

// =========================================================================
// import_provider_details
// =========================================================================

#[tokio::test]
async fn test_import_details_skips_when_present() {
    let synth = Arc::new(MockProvider::failing("SYNTH").with_info("New", "https://new"));
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    let mut security = aapl();
    security.name = Some("Apple Inc.".to_string());
    security.logo_url = Some("https://logo".to_string());

    f.service
        .import_provider_details(&mut security, false)
        .await
        .unwrap();

    assert!(synth.calls().is_empty());
    assert_eq!(security.name.as_deref(), Some("Apple Inc."));
}

#[tokio::test]
async fn test_import_details_clear_cache_refetches() {
    let synth = Arc::new(MockProvider::failing("SYNTH").with_info("Apple", "https://new"));
    let f = fixture(Some(synth.clone()), None, InMemoryPriceRepository::default());

    let mut security = aapl();
    security.name = Some("Old".to_string());
    security.logo_url = Some("https://old".to_string());

    f.service
        .import_provider_details(&mut security, true)
        .await
        .unwrap();

    assert_eq!(security.name.as_deref(), Some("Apple"));
    assert_eq!(security.logo_url.as_deref(), Some("https://new"));
}

#[tokio::test]
async fn test_import_details_uses_fallback() {
    let synth = Arc::new(MockProvider::failing("SYNTH"));
    let fmp = Arc::new(MockProvider::failing("FMP").with_info("Apple Inc.", "https://fmp"));
    let f = fixture(Some(synth.clone()), Some(fmp), InMemoryPriceRepository::default());

    let mut security = aapl();
    f.service
        .import_provider_details(&mut security, false)
        .await
        .unwrap();

    assert_eq!(synth.calls(), vec!["info:AAPL"]);
    assert_eq!(security.name.as_deref(), Some("Apple Inc."));
    assert_eq!(security.logo_url.as_deref(), Some("https://fmp"));
    assert!(f.reporter.is_empty());
}

#[tokio::test]
async fn test_import_details_reports_when_all_fail() {
    let f = fixture(
        Some(Arc::new(MockProvider::failing("SYNTH"))),
        Some(Arc::new(MockProvider::failing("FMP"))),
        InMemoryPriceRepository::default(),
    );

    let mut security = aapl();
    f.service
        .import_provider_details(&mut security, false)
        .await
        .unwrap();

    let reports = f.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error, SECURITY_INFO_MISSING_ERROR);
    assert_eq!(reports[0].level, ReportLevel::Warning);
    assert_eq!(reports[0].tags["security_id"], "sec-1");
    assert_eq!(reports[0].context["security"]["ticker"], "AAPL");
    assert_eq!(reports[0].context["security"]["id"], "sec-1");
    assert!(security.name.is_none());
}

// =========================================================================
// import_provider_prices
// =========================================================================

#[tokio::test]
async fn test_import_prices_falls_back_when_primary_returns_nothing() {
    let synth = Arc::new(MockProvider::failing("SYNTH").with_prices(vec![]));
    let fmp = Arc::new(MockProvider::failing("FMP").with_prices(vec![
        price(date(2024, 1, 2), dec!(185.64), "USD"),
        price(date(2024, 1, 3), dec!(184.25), "USD"),
    ]));
    let f = fixture(Some(synth), Some(fmp), InMemoryPriceRepository::default());

    let imported = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 2), date(2024, 1, 3), false)
        .await
        .unwrap();

    assert_eq!(imported, 2);
    assert_eq!(f.prices.upsert_calls(), 1);
}

#[tokio::test]
async fn test_import_prices_stops_at_first_successful_provider() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH")
            .with_prices(vec![price(date(2024, 1, 2), dec!(185.64), "USD")]),
    );
    let fmp = Arc::new(MockProvider::failing("FMP").with_prices(vec![]));
    let f = fixture(Some(synth), Some(fmp.clone()), InMemoryPriceRepository::default());

    let imported = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 2), date(2024, 1, 2), false)
        .await
        .unwrap();

    assert_eq!(imported, 1);
    assert!(fmp.calls().is_empty());
}

#[tokio::test]
async fn test_import_prices_all_failing_is_zero() {
    let f = fixture(
        Some(Arc::new(MockProvider::failing("SYNTH"))),
        Some(Arc::new(MockProvider::failing("FMP"))),
        InMemoryPriceRepository::default(),
    );

    let imported = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 2), date(2024, 1, 5), false)
        .await
        .unwrap();

    assert_eq!(imported, 0);
    assert_eq!(f.prices.upsert_calls(), 0);
}

#[tokio::test]
async fn test_import_prices_skips_providers_when_cache_is_complete() {
    let synth = Arc::new(MockProvider::failing("SYNTH").with_prices(vec![]));
    let f = fixture(
        Some(synth.clone()),
        None,
        InMemoryPriceRepository::with_rows(vec![
            row(date(2024, 1, 2), dec!(1), "USD"),
            row(date(2024, 1, 3), dec!(2), "USD"),
        ]),
    );

    let imported = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 2), date(2024, 1, 3), false)
        .await
        .unwrap();

    assert_eq!(imported, 0);
    assert!(synth.calls().is_empty());
}

#[tokio::test]
async fn test_import_prices_rejects_inverted_range() {
    let f = fixture(
        Some(Arc::new(MockProvider::failing("SYNTH"))),
        None,
        InMemoryPriceRepository::default(),
    );

    let result = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 5), date(2024, 1, 2), false)
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
}

// =========================================================================
// PriceImporter
// =========================================================================

fn importer(
    provider: MockProvider,
    repository: Arc<InMemoryPriceRepository>,
    start: NaiveDate,
    end: NaiveDate,
) -> PriceImporter {
    PriceImporter::new(aapl(), Arc::new(provider), repository, start, end)
}

#[tokio::test]
async fn test_importer_carries_prices_forward_over_gaps() {
    let repository = Arc::new(InMemoryPriceRepository::default());
    // Friday and Monday only
    let provider = MockProvider::failing("SYNTH").with_prices(vec![
        price(date(2024, 1, 5), dec!(181.18), "USD"),
        price(date(2024, 1, 8), dec!(185.56), "USD"),
    ]);

    let imported = importer(provider, repository.clone(), date(2024, 1, 4), date(2024, 1, 8))
        .import_provider_prices()
        .await
        .unwrap();

    // Jan 4 has no price yet and is skipped
    assert_eq!(imported, 4);
    assert_eq!(
        repository.rows(),
        vec![
            row(date(2024, 1, 5), dec!(181.18), "USD"),
            row(date(2024, 1, 6), dec!(181.18), "USD"),
            row(date(2024, 1, 7), dec!(181.18), "USD"),
            row(date(2024, 1, 8), dec!(185.56), "USD"),
        ]
    );
}

#[tokio::test]
async fn test_importer_seeds_carry_forward_from_earlier_cached_price() {
    // Friday is cached, the range starts on Saturday
    let repository = Arc::new(InMemoryPriceRepository::with_rows(vec![row(
        date(2024, 1, 5),
        dec!(181.18),
        "USD",
    )]));
    let provider = MockProvider::failing("SYNTH")
        .with_prices(vec![price(date(2024, 1, 8), dec!(185.56), "USD")]);

    let imported = importer(provider, repository.clone(), date(2024, 1, 6), date(2024, 1, 8))
        .import_provider_prices()
        .await
        .unwrap();

    assert_eq!(imported, 3);
    assert_eq!(
        repository.rows(),
        vec![
            row(date(2024, 1, 5), dec!(181.18), "USD"),
            row(date(2024, 1, 6), dec!(181.18), "USD"),
            row(date(2024, 1, 7), dec!(181.18), "USD"),
            row(date(2024, 1, 8), dec!(185.56), "USD"),
        ]
    );
}

#[tokio::test]
async fn test_import_prices_weekend_start_completes_cache() {
    let synth = Arc::new(
        MockProvider::failing("SYNTH")
            .with_prices(vec![price(date(2024, 1, 8), dec!(185.56), "USD")]),
    );
    let f = fixture(
        Some(synth.clone()),
        None,
        InMemoryPriceRepository::with_rows(vec![row(date(2024, 1, 5), dec!(181.18), "USD")]),
    );

    let first = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 6), date(2024, 1, 8), false)
        .await
        .unwrap();
    let second = f
        .service
        .import_provider_prices(&aapl(), date(2024, 1, 6), date(2024, 1, 8), false)
        .await
        .unwrap();

    assert_eq!(first, 3);
    assert_eq!(second, 0);
    assert_eq!(synth.calls().len(), 1);
    assert_eq!(f.prices.upsert_calls(), 1);
}

#[tokio::test]
async fn test_importer_prefers_cache_unless_cleared() {
    let cached = vec![row(date(2024, 1, 2), dec!(100), "USD")];
    let provided = vec![
        price(date(2024, 1, 2), dec!(185.64), "USD"),
        price(date(2024, 1, 3), dec!(184.25), "USD"),
    ];

    let repository = Arc::new(InMemoryPriceRepository::with_rows(cached.clone()));
    let provider = MockProvider::failing("SYNTH").with_prices(provided.clone());
    importer(provider, repository.clone(), date(2024, 1, 2), date(2024, 1, 3))
        .import_provider_prices()
        .await
        .unwrap();
    assert_eq!(repository.rows()[0].price, dec!(100));
    assert_eq!(repository.rows()[1].price, dec!(184.25));

    let repository = Arc::new(InMemoryPriceRepository::with_rows(cached));
    let provider = MockProvider::failing("SYNTH").with_prices(provided);
    importer(provider, repository.clone(), date(2024, 1, 2), date(2024, 1, 3))
        .clear_cache(true)
        .import_provider_prices()
        .await
        .unwrap();
    assert_eq!(repository.rows()[0].price, dec!(185.64));
}

#[tokio::test]
async fn test_importer_currency_fallbacks() {
    // Jan 2 only cached (EUR), Jan 3 provided (GBP), Jan 4 carried forward
    let repository = Arc::new(InMemoryPriceRepository::with_rows(vec![row(
        date(2024, 1, 2),
        dec!(10),
        "EUR",
    )]));
    let provider = MockProvider::failing("SYNTH")
        .with_prices(vec![price(date(2024, 1, 3), dec!(11), "GBP")]);

    importer(provider, repository.clone(), date(2024, 1, 2), date(2024, 1, 4))
        .import_provider_prices()
        .await
        .unwrap();

    let currencies: Vec<String> = repository.rows().into_iter().map(|r| r.currency).collect();
    assert_eq!(currencies, vec!["EUR", "GBP", "GBP"]);
}

#[tokio::test]
async fn test_importer_provider_error_imports_nothing() {
    let repository = Arc::new(InMemoryPriceRepository::default());

    let imported = importer(
        MockProvider::failing("SYNTH"),
        repository.clone(),
        date(2024, 1, 2),
        date(2024, 1, 3),
    )
    .import_provider_prices()
    .await
    .unwrap();

    assert_eq!(imported, 0);
    assert_eq!(repository.upsert_calls(), 0);
}

#[tokio::test]
async fn test_importer_rejects_inverted_range() {
    let result = importer(
        MockProvider::failing("SYNTH").with_prices(vec![]),
        Arc::new(InMemoryPriceRepository::default()),
        date(2024, 1, 3),
        date(2024, 1, 2),
    )
    .import_provider_prices()
    .await;

    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_cached_range_complete() {
    let repository = InMemoryPriceRepository::with_rows(vec![
        row(date(2024, 1, 2), dec!(1), "USD"),
        row(date(2024, 1, 3), dec!(1), "USD"),
    ]);

    assert!(cached_range_complete(&repository, "sec-1", date(2024, 1, 2), date(2024, 1, 3)).unwrap());
    assert!(!cached_range_complete(&repository, "sec-1", date(2024, 1, 2), date(2024, 1, 4)).unwrap());
    assert!(!cached_range_complete(&repository, "other", date(2024, 1, 2), date(2024, 1, 3)).unwrap());
}
