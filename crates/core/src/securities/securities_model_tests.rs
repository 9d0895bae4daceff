use chrono::NaiveDate;
use maybe_market_data::{self as market_data, Price};
use rust_decimal_macros::dec;

use super::securities_model::{Security, SecurityPrice};

#[test]
fn test_security_from_search_result() {
    let result = market_data::Security::new("AAPL")
        .name("Apple Inc.")
        .exchange("XNAS")
        .country("US");

    let security = Security::from(result);

    assert_eq!(security.id, "");
    assert_eq!(security.ticker, "AAPL");
    assert_eq!(security.name.as_deref(), Some("Apple Inc."));
    assert_eq!(security.exchange_operating_mic.as_deref(), Some("XNAS"));
    assert_eq!(security.country_code.as_deref(), Some("US"));
    assert!(security.logo_url.is_none());
}

#[test]
fn test_has_provider_details() {
    let mut security = Security::new("sec-1", "AAPL");
    assert!(!security.has_provider_details());

    security.name = Some("Apple Inc.".to_string());
    assert!(!security.has_provider_details());

    security.logo_url = Some(" ".to_string());
    assert!(!security.has_provider_details());

    security.logo_url = Some("https://logo.example/aapl.png".to_string());
    assert!(security.has_provider_details());
}

#[test]
fn test_security_price_conversions() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut security = Security::new("sec-1", "SHEL");
    security.exchange_operating_mic = Some("XLON".to_string());

    let provided = Price::new("SHEL", date, dec!(25.4), "GBP");
    let row = SecurityPrice::from_provider(&security.id, &provided);
    assert_eq!(row.security_id, "sec-1");
    assert_eq!(row.currency, "GBP");

    let price = row.to_price(&security);
    assert_eq!(price.symbol, "SHEL");
    assert_eq!(price.price, dec!(25.4));
    assert_eq!(price.exchange_operating_mic.as_deref(), Some("XLON"));
}

#[test]
fn test_security_serializes_camel_case() {
    let security = Security::new("sec-1", "AAPL");
    let json = serde_json::to_value(&security).unwrap();
    assert_eq!(json["ticker"], "AAPL");
    assert!(json.get("logoUrl").is_some());
}
