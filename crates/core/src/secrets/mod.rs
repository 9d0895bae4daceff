//! Secret storage abstraction.
//!
//! API keys live in a platform secret store (keyring, encrypted settings
//! table, ...). The host application supplies the implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{Error, Result};

const SERVICE_PREFIX: &str = "maybe";

/// Namespaced identifier for a secret, e.g. `maybe_fmp_api_key`.
pub fn format_service_id(service: &str) -> String {
    format!("{}_{}", SERVICE_PREFIX, service.trim().to_lowercase())
}

/// Trait for reading and writing secrets.
pub trait SecretStore: Send + Sync {
    fn set_secret(&self, service: &str, secret: &str) -> Result<()>;
    fn get_secret(&self, service: &str) -> Result<Option<String>>;
    fn delete_secret(&self, service: &str) -> Result<()>;
}

/// Process-local secret store. Nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for InMemorySecretStore {
    fn set_secret(&self, service: &str, secret: &str) -> Result<()> {
        self.secrets
            .write()
            .map_err(|e| Error::Secret(e.to_string()))?
            .insert(format_service_id(service), secret.to_string());
        Ok(())
    }

    fn get_secret(&self, service: &str) -> Result<Option<String>> {
        Ok(self
            .secrets
            .read()
            .map_err(|e| Error::Secret(e.to_string()))?
            .get(&format_service_id(service))
            .cloned())
    }

    fn delete_secret(&self, service: &str) -> Result<()> {
        self.secrets
            .write()
            .map_err(|e| Error::Secret(e.to_string()))?
            .remove(&format_service_id(service));
        Ok(())
    }
}
