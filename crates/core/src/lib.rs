//! Maybe Core - security provider fallback, price import and key resolution.
//!
//! Storage-agnostic: persistence is reached through the repository traits in
//! [`securities`], API keys through [`secrets::SecretStore`]. The vendor
//! adapters themselves live in `maybe-market-data`.

pub mod errors;
pub mod providers;
pub mod secrets;
pub mod securities;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use providers::{ProviderKey, ProviderRegistryConfig, SecurityProviderRegistry};
pub use securities::{
    PriceImporter, Security, SecurityPrice, SecurityPriceRepositoryTrait, SecurityRepositoryTrait,
    SecurityService, SecurityServiceTrait,
};
