//! Core error types for the securities layer.
//!
//! Storage and secret-store failures are carried as strings so this type
//! stays independent of whatever backs the repositories.

use maybe_market_data::MarketDataError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the securities layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Secret store error: {0}")]
    Secret(String),

    #[error("Input validation failed: {0}")]
    Validation(String),

    /// No configured provider could supply profile data for a security.
    #[error("Security info missing: {0}")]
    SecurityInfoMissing(String),
}
