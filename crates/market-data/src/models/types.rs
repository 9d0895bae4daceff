/// Market Identifier Code (ISO 10383)
pub type Mic = String;

/// Currency code (ISO 4217)
pub type Currency = String;

/// Currency assumed when a vendor does not state one.
pub const DEFAULT_CURRENCY: &str = "USD";
