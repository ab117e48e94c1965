//! In-memory secret store backend.
//!
//! Holds secrets in process memory for development and tests. Supports the
//! full [`SecretStore`] contract including field rotation and read grants,
//! so handler-level behavior can be exercised without a live backend.
//!
//! Not for production: nothing is encrypted, persisted, or access-controlled.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::client::{GeneratedSecretSpec, SecretMetadata, SecretStore};
use super::error::{Result, SecretsError};
use super::generate::{generate_password, PasswordSpec};

#[derive(Debug, Clone)]
struct StoredSecret {
    value: String,
    metadata: SecretMetadata,
    readers: Vec<String>,
}

/// In-memory [`SecretStore`] implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    inner: Arc<RwLock<HashMap<String, StoredSecret>>>,
}

impl InMemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret with a literal JSON blob, bypassing generation.
    ///
    /// Test convenience for secrets owned by another system, e.g. the
    /// instance's root credential.
    pub async fn seed(&self, name: &str, value: &str) {
        let mut inner = self.inner.write().await;
        inner.insert(
            name.to_string(),
            StoredSecret {
                value: value.to_string(),
                metadata: SecretMetadata::new(name),
                readers: Vec::new(),
            },
        );
    }

    /// Principals granted read access to a secret, in grant order.
    pub async fn readers(&self, name: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        inner
            .get(name)
            .map(|s| s.readers.clone())
            .ok_or_else(|| SecretsError::not_found(name))
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let inner = self.inner.read().await;
        inner
            .get(name)
            .map(|s| s.value.clone())
            .ok_or_else(|| SecretsError::not_found(name))
    }

    async fn create_secret(&self, name: &str, spec: &GeneratedSecretSpec) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.contains_key(name) {
            return Err(SecretsError::already_exists(name));
        }

        let mut blob = match &spec.template {
            serde_json::Value::Object(fields) => fields.clone(),
            _ => {
                return Err(SecretsError::invalid_value("secret template must be a JSON object"))
            }
        };
        let generated = generate_password(&spec.password)?;
        blob.insert(spec.generate_key.clone(), serde_json::Value::String(generated));

        let value = serde_json::to_string(&serde_json::Value::Object(blob))?;
        inner.insert(
            name.to_string(),
            StoredSecret { value, metadata: SecretMetadata::new(name), readers: Vec::new() },
        );
        Ok(())
    }

    async fn rotate_field(&self, name: &str, key: &str, policy: &PasswordSpec) -> Result<String> {
        let mut inner = self.inner.write().await;
        let stored = inner.get_mut(name).ok_or_else(|| SecretsError::not_found(name))?;

        let mut blob: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&stored.value)?;
        if !blob.contains_key(key) {
            return Err(SecretsError::invalid_value(format!(
                "secret '{name}' has no field '{key}' to rotate"
            )));
        }

        let generated = generate_password(policy)?;
        blob.insert(key.to_string(), serde_json::Value::String(generated.clone()));
        stored.value = serde_json::to_string(&serde_json::Value::Object(blob))?;
        stored.metadata.updated_at = Utc::now();
        stored.metadata.version = stored.metadata.version.map(|v| v + 1);

        Ok(generated)
    }

    async fn delete_secret(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SecretsError::not_found(name))
    }

    async fn secret_exists(&self, name: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.contains_key(name))
    }

    async fn metadata(&self, name: &str) -> Result<SecretMetadata> {
        let inner = self.inner.read().await;
        inner
            .get(name)
            .map(|s| s.metadata.clone())
            .ok_or_else(|| SecretsError::not_found(name))
    }

    async fn grant_read(&self, name: &str, principal: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let stored = inner.get_mut(name).ok_or_else(|| SecretsError::not_found(name))?;
        if !stored.readers.iter().any(|r| r == principal) {
            stored.readers.push(principal.to_string());
        }
        Ok(())
    }
}
