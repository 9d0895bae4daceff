//! Error types for the market data crate.
//!
//! Every vendor adapter maps its failures into [`MarketDataError`]. The
//! coordinator in `maybe-core` treats any error as a signal to fall back to
//! the next configured provider; [`MarketDataError::is_retryable`] is only
//! consulted by the HTTP layer to decide whether a request is repeated
//! against the *same* vendor.

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The vendor rejected our API key (HTTP 401).
    #[error("{provider} API authentication failed. Please check your API key.")]
    AuthenticationFailed {
        /// The provider that rejected the request
        provider: String,
    },

    /// The vendor rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the vendor timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The vendor could not be reached or answered 502/503/504.
    #[error("Service unavailable: {provider} - {message}")]
    ServiceUnavailable {
        /// The provider that was unavailable
        provider: String,
        /// Status or transport details
        message: String,
    },

    /// The vendor has no data for the symbol, date or range.
    #[error("Not found: {provider} - {message}")]
    NotFound {
        /// The provider that returned no data
        provider: String,
        /// What was missing
        message: String,
    },

    /// A provider-specific error occurred (non-2xx status, transport failure).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The vendor answered 2xx but the body could not be understood.
    #[error("Invalid response: {provider} - {message}")]
    InvalidResponse {
        /// The provider that sent the body
        provider: String,
        /// Parse failure details
        message: String,
    },

    /// A single price record was unusable. Reported, never returned to callers
    /// of the batch operations.
    #[error("{provider} returned invalid security price data: {message}")]
    InvalidSecurityPrice {
        /// The provider that sent the record
        provider: String,
        /// Which record was dropped
        message: String,
    },

    /// The vendor profile could not be mapped into a `SecurityInfo`.
    #[error("{provider} returned invalid security info: {message}")]
    InvalidSecurityInfo {
        /// The provider that sent the profile
        provider: String,
        /// Mapping failure details
        message: String,
    },
}

impl MarketDataError {
    /// Returns the provider id this error originated from.
    pub fn provider(&self) -> &str {
        match self {
            Self::AuthenticationFailed { provider }
            | Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::ServiceUnavailable { provider, .. }
            | Self::NotFound { provider, .. }
            | Self::ProviderError { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::InvalidSecurityPrice { provider, .. }
            | Self::InvalidSecurityInfo { provider, .. } => provider,
        }
    }

    /// Whether the HTTP layer may repeat the request against the same vendor.
    ///
    /// Only timeouts qualify. Rate limits and unavailable vendors fall
    /// through to the next provider instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the vendor rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failed_message() {
        let error = MarketDataError::AuthenticationFailed {
            provider: "FMP".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "FMP API authentication failed. Please check your API key."
        );
        assert!(error.is_unauthorized());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_only_timeouts_are_retryable() {
        let error = MarketDataError::Timeout {
            provider: "FMP".to_string(),
        };
        assert!(error.is_retryable());

        let error = MarketDataError::RateLimited {
            provider: "SYNTH".to_string(),
        };
        assert!(!error.is_retryable());

        let error = MarketDataError::ServiceUnavailable {
            provider: "FMP".to_string(),
            message: "HTTP 503 Service Unavailable".to_string(),
        };
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_terminal_errors_are_not_retryable() {
        let error = MarketDataError::NotFound {
            provider: "FMP".to_string(),
            message: "No profile data found for ZZZZ".to_string(),
        };
        assert!(!error.is_retryable());

        let error = MarketDataError::InvalidResponse {
            provider: "SYNTH".to_string(),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_provider_accessor() {
        let error = MarketDataError::ProviderError {
            provider: "SYNTH".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(error.provider(), "SYNTH");
        assert_eq!(format!("{}", error), "Provider error: SYNTH - HTTP 500");
    }
}
