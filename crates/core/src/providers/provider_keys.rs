use std::fmt;

use log::warn;

use crate::errors::Result;
use crate::secrets::SecretStore;

/// Vendors that can serve the securities concept, in fallback order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKey {
    Synth,
    Fmp,
}

impl ProviderKey {
    /// Securities providers, primary first.
    pub const SECURITIES: [ProviderKey; 2] = [ProviderKey::Synth, ProviderKey::Fmp];

    /// Matches `SecurityProvider::id()` of the adapter.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Synth => maybe_market_data::provider::synth::PROVIDER_ID,
            Self::Fmp => maybe_market_data::provider::fmp::PROVIDER_ID,
        }
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Synth => "SYNTH_API_KEY",
            Self::Fmp => "FMP_API_KEY",
        }
    }

    /// Secret-store entry holding the key.
    pub fn setting_key(&self) -> &'static str {
        match self {
            Self::Synth => "synth_api_key",
            Self::Fmp => "fmp_api_key",
        }
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Resolve the API key for `key` from `env_lookup` first, then the secret
/// store.
///
/// Blank values count as missing at both levels.
pub fn resolve_api_key_with<F>(
    key: ProviderKey,
    env_lookup: F,
    store: &dyn SecretStore,
) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = non_blank(env_lookup(key.env_var())) {
        return Ok(Some(value));
    }

    match store.get_secret(key.setting_key()) {
        Ok(value) => Ok(non_blank(value)),
        Err(e) => {
            warn!("Failed to read {} from secret store: {}", key.setting_key(), e);
            Err(e)
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
