//! Core secret store trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::generate::PasswordSpec;

/// Metadata about a secret stored in the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretMetadata {
    /// Secret name
    pub name: String,

    /// Secret version (if the backend supports versioning)
    pub version: Option<u64>,

    /// When the secret was created
    pub created_at: DateTime<Utc>,

    /// When the secret was last rotated/updated
    pub updated_at: DateTime<Utc>,
}

impl SecretMetadata {
    /// Create new secret metadata stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { name: name.into(), version: Some(1), created_at: now, updated_at: now }
    }
}

/// Creation spec for a secret with one store-generated field.
///
/// Mirrors the generate-against-template contract of managed secret stores:
/// the fixed fields are supplied as a JSON object and the named field is
/// filled with a random value under the given policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSecretSpec {
    /// Fixed fields of the secret, as a JSON object.
    pub template: serde_json::Value,

    /// Key of the field to generate into the template.
    pub generate_key: String,

    /// Generation policy for the generated field.
    pub password: PasswordSpec,
}

impl GeneratedSecretSpec {
    /// Spec with the default generation policy.
    pub fn new(template: serde_json::Value, generate_key: impl Into<String>) -> Self {
        Self { template, generate_key: generate_key.into(), password: PasswordSpec::default() }
    }
}

/// Trait for secret store backends.
///
/// Secrets are opaque JSON blobs addressed by name. Implementations MUST NOT
/// log secret values, and network-backed implementations MUST use TLS.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret's JSON blob by name.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if the secret doesn't exist
    /// - [`SecretsError::ConnectionFailed`] if the backend is unreachable
    /// - [`SecretsError::AccessDenied`] if the caller lacks permission
    ///
    /// [`SecretsError::NotFound`]: super::error::SecretsError::NotFound
    /// [`SecretsError::ConnectionFailed`]: super::error::SecretsError::ConnectionFailed
    /// [`SecretsError::AccessDenied`]: super::error::SecretsError::AccessDenied
    async fn get_secret(&self, name: &str) -> Result<String>;

    /// Create a secret from a template plus one generated field.
    ///
    /// Fails with [`SecretsError::AlreadyExists`] on a name collision; the
    /// existing secret is left untouched so an established password is never
    /// silently regenerated.
    ///
    /// [`SecretsError::AlreadyExists`]: super::error::SecretsError::AlreadyExists
    async fn create_secret(&self, name: &str, spec: &GeneratedSecretSpec) -> Result<()>;

    /// Regenerate one field of an existing secret under the given policy.
    ///
    /// Returns the new field value. This is the rotation primitive: every
    /// reader observes the new value on its next fetch, with no separate
    /// synchronization step.
    async fn rotate_field(&self, name: &str, key: &str, policy: &PasswordSpec) -> Result<String>;

    /// Delete a secret from the backend.
    async fn delete_secret(&self, name: &str) -> Result<()>;

    /// Check whether a secret exists.
    async fn secret_exists(&self, name: &str) -> Result<bool>;

    /// Get metadata for a secret without retrieving its value.
    async fn metadata(&self, name: &str) -> Result<SecretMetadata>;

    /// Grant a principal read access to a secret.
    async fn grant_read(&self, name: &str, principal: &str) -> Result<()>;
}
