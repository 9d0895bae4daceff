//! Providers module - vendor selection and API-key resolution for the
//! securities concept.

mod provider_keys;
mod provider_registry;


pub use provider_keys::{resolve_api_key_with, ProviderKey};
pub use provider_registry::{ProviderRegistryConfig, SecurityProviderRegistry};
