//! Security provider abstractions and implementations.
//!
//! This module contains:
//! - The `SecurityProvider` trait that all vendors implement
//! - The shared HTTP client and its retry policy
//! - Concrete vendor adapters (Synth, Financial Modeling Prep)

mod http;
mod traits;

pub mod fmp;
pub mod synth;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::MarketDataError;
use crate::reporting::{ErrorReport, ErrorReporter};

// Re-exports
pub use http::{RetryPolicy, USER_AGENT};
pub use traits::SecurityProvider;

/// Error class name used when a malformed price record is reported.
pub const INVALID_SECURITY_PRICE_ERROR: &str = "InvalidSecurityPriceError";

/// Read a decimal from a JSON number or numeric string.
///
/// Numbers go through their shortest textual form so `185.64` stays
/// `185.64` instead of picking up binary float noise.
pub(crate) fn json_decimal(value: Option<&Value>) -> Option<Decimal> {
    let text = match value? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parse a vendor date. Accepts `YYYY-MM-DD` with an optional time suffix.
pub(crate) fn json_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?.trim();
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Non-blank string field.
pub(crate) fn json_string(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Log and report a price record that had to be dropped.
pub(crate) fn report_invalid_price(
    reporter: &dyn ErrorReporter,
    provider: &str,
    symbol: &str,
    record: &Value,
) {
    let date = record.get("date").cloned().unwrap_or(Value::Null);
    warn!(
        "{} returned invalid price data for security {} on: {}. Price data: {}",
        provider, symbol, date, record
    );

    let error = MarketDataError::InvalidSecurityPrice {
        provider: provider.to_string(),
        message: format!("{} on {}", symbol, date),
    };
    reporter.capture(
        ErrorReport::warning(INVALID_SECURITY_PRICE_ERROR, error.to_string())
            .tag("provider", provider)
            .context("security", json!({ "symbol": symbol, "date": date })),
    );
}
