use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Currency, Mic};

/// Daily closing price of a security.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Ticker symbol
    pub symbol: String,

    /// Trading day
    pub date: NaiveDate,

    /// Closing price (or the vendor's best substitute for it)
    pub price: Decimal,

    /// Price currency
    pub currency: Currency,

    /// Exchange the price was quoted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_operating_mic: Option<Mic>,
}

impl Price {
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            price,
            currency: currency.into(),
            exchange_operating_mic: None,
        }
    }

    /// Set the exchange
    pub fn on_exchange(mut self, mic: Option<Mic>) -> Self {
        self.exchange_operating_mic = mic;
        self
    }
}
