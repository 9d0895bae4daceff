use std::sync::Arc;

use log::{info, warn};
use maybe_market_data::provider::{fmp, synth};
use maybe_market_data::{
    ErrorReporter, FmpProvider, LogErrorReporter, RetryPolicy, SecurityProvider, SynthProvider,
};

use super::provider_keys::{resolve_api_key_with, ProviderKey};
use crate::secrets::SecretStore;

/// Connection settings shared by every securities provider.
#[derive(Clone)]
pub struct ProviderRegistryConfig {
    pub synth_base_url: String,
    pub fmp_base_url: String,
    pub retry: RetryPolicy,
    /// Receives malformed-record reports from the adapters.
    pub reporter: Arc<dyn ErrorReporter>,
}

impl Default for ProviderRegistryConfig {
    fn default() -> Self {
        Self {
            synth_base_url: synth::BASE_URL.to_string(),
            fmp_base_url: fmp::BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            reporter: Arc::new(LogErrorReporter),
        }
    }
}

/// Configured providers for the securities concept, in fallback order.
///
/// A provider is only registered when an API key resolves for it.
#[derive(Clone, Default)]
pub struct SecurityProviderRegistry {
    providers: Vec<(ProviderKey, Arc<dyn SecurityProvider>)>,
}

impl SecurityProviderRegistry {
    /// Build the registry from the process environment and `store`.
    pub fn for_securities(store: &dyn SecretStore, config: ProviderRegistryConfig) -> Self {
        Self::for_securities_with_env(store, config, |name| std::env::var(name).ok())
    }

    /// Build the registry with an injectable environment lookup.
    pub fn for_securities_with_env<F>(
        store: &dyn SecretStore,
        config: ProviderRegistryConfig,
        env_lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers: Vec<(ProviderKey, Arc<dyn SecurityProvider>)> = Vec::new();

        for key in ProviderKey::SECURITIES {
            let api_key = match resolve_api_key_with(key, &env_lookup, store) {
                Ok(Some(api_key)) => api_key,
                Ok(None) => {
                    info!("No API key configured for provider {}, skipping.", key);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to resolve API key for provider {}: {}. Skipping.", key, e);
                    continue;
                }
            };

            providers.push((key, Self::build(key, api_key, &config)));
            info!("Configured securities provider: {}", key);
        }

        if providers.is_empty() {
            warn!("No securities providers configured. Security search and prices are unavailable.");
        }

        Self { providers }
    }

    /// Build a registry from already constructed providers.
    ///
    /// Entries are reordered into fallback order; a later duplicate key
    /// replaces an earlier one.
    pub fn from_providers(entries: Vec<(ProviderKey, Arc<dyn SecurityProvider>)>) -> Self {
        let mut providers: Vec<(ProviderKey, Arc<dyn SecurityProvider>)> = Vec::new();
        for (key, provider) in entries {
            providers.retain(|(k, _)| *k != key);
            providers.push((key, provider));
        }
        providers.sort_by_key(|(key, _)| *key);
        Self { providers }
    }

    fn build(
        key: ProviderKey,
        api_key: String,
        config: &ProviderRegistryConfig,
    ) -> Arc<dyn SecurityProvider> {
        match key {
            ProviderKey::Synth => Arc::new(
                SynthProvider::with_base_url(api_key, config.synth_base_url.clone())
                    .with_retry(config.retry.clone())
                    .with_error_reporter(config.reporter.clone()),
            ),
            ProviderKey::Fmp => Arc::new(
                FmpProvider::with_base_url(api_key, config.fmp_base_url.clone())
                    .with_retry(config.retry.clone())
                    .with_error_reporter(config.reporter.clone()),
            ),
        }
    }

    /// The provider for `key`, or `None` when it has no API key.
    pub fn get_provider(&self, key: ProviderKey) -> Option<Arc<dyn SecurityProvider>> {
        self.providers
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, provider)| provider.clone())
    }

    /// Configured providers, primary first.
    pub fn providers(&self) -> Vec<Arc<dyn SecurityProvider>> {
        self.providers
            .iter()
            .map(|(_, provider)| provider.clone())
            .collect()
    }

    /// Keys of the configured providers, primary first.
    pub fn keys(&self) -> Vec<ProviderKey> {
        self.providers.iter().map(|(key, _)| *key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
