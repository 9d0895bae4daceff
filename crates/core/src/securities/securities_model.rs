use chrono::NaiveDate;
use maybe_market_data::{self as market_data, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A security as stored by the application.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    /// Empty for search results that were never persisted
    pub id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub exchange_operating_mic: Option<String>,
    pub country_code: Option<String>,
}

impl Security {
    pub fn new(id: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Whether both display fields are already filled in.
    pub fn has_provider_details(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.name) && present(&self.logo_url)
    }
}

impl From<market_data::Security> for Security {
    fn from(security: market_data::Security) -> Self {
        Self {
            id: String::new(),
            ticker: security.symbol,
            name: security.name,
            logo_url: security.logo_url,
            exchange_operating_mic: security.exchange_operating_mic,
            country_code: security.country_code,
        }
    }
}

/// A cached daily price row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPrice {
    pub security_id: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub currency: String,
}

impl SecurityPrice {
    /// Row for `security` built from a provider price.
    pub fn from_provider(security_id: impl Into<String>, price: &Price) -> Self {
        Self {
            security_id: security_id.into(),
            date: price.date,
            price: price.price,
            currency: price.currency.clone(),
        }
    }

    /// View the cached row as a provider-style price for `security`.
    pub fn to_price(&self, security: &Security) -> Price {
        Price::new(security.ticker.clone(), self.date, self.price, self.currency.clone())
            .on_exchange(security.exchange_operating_mic.clone())
    }
}
