//! Security search results and profile data.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::Mic;

/// A security returned by a vendor's symbol search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    /// Ticker symbol (e.g., "AAPL")
    pub symbol: String,

    /// Display name (e.g., "Apple Inc.")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Logo URL, when the vendor provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Exchange the listing trades on (MIC or vendor short name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_operating_mic: Option<Mic>,

    /// Country of the listing (ISO 3166-1 alpha-2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl Security {
    /// Create a search result with only a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            logo_url: None,
            exchange_operating_mic: None,
            country_code: None,
        }
    }

    /// Set the name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the exchange
    pub fn exchange(mut self, mic: impl Into<String>) -> Self {
        self.exchange_operating_mic = Some(mic.into());
        self
    }

    /// Set the country
    pub fn country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }
}

/// Classification of a security as reported by the vendor.
///
/// Serialized as the plain string from [`SecurityKind::as_str`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SecurityKind {
    #[default]
    Stock,
    Etf,
    MutualFund,
    /// Anything the vendor labels that we don't map (e.g., "reit", "adr")
    Other(String),
}

impl SecurityKind {
    /// Parse a vendor kind string. Matching is case-insensitive and tolerant
    /// of spaces or dashes in place of underscores.
    pub fn from_vendor(kind: &str) -> Self {
        let normalized = kind.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "stock" | "common_stock" | "equity" => Self::Stock,
            "etf" | "etp" => Self::Etf,
            "mutual_fund" | "mutualfund" | "fund" => Self::MutualFund,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
            Self::MutualFund => "mutual_fund",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for SecurityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SecurityKind {
    fn from(kind: String) -> Self {
        Self::from_vendor(&kind)
    }
}

impl From<SecurityKind> for String {
    fn from(kind: SecurityKind) -> Self {
        match kind {
            SecurityKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

/// Profile data for a single security.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    /// Ticker symbol as requested
    pub symbol: String,

    /// Company or fund name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Related links (homepage first when known)
    #[serde(default)]
    pub links: Vec<String>,

    /// Logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Business description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Security classification
    pub kind: SecurityKind,

    /// Exchange the profile was requested for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_operating_mic: Option<Mic>,
}
