//! HashiCorp Vault secret store backend.
//!
//! Persists secrets in Vault's KV v2 engine through [`vaultrs`]. Secrets are
//! stored as flat string maps and surfaced to callers as JSON blobs, so the
//! rest of the system is backend-agnostic. Read grants are materialized as
//! named read-only ACL policies on the secret's data path.
//!
//! # Configuration
//!
//! - `VAULT_ADDR`: Vault server address (HTTPS recommended)
//! - `VAULT_TOKEN`: authentication token
//! - `VAULT_NAMESPACE`: optional namespace for multi-tenancy
//! - `VAULT_MOUNT_PATH`: KV v2 mount path (default: "secret")
//!
//! # Security
//!
//! - All communication uses TLS
//! - Tokens and secret values are never logged
//! - KV v2 provides automatic versioning for rotation audits

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::{GeneratedSecretSpec, SecretMetadata, SecretStore};
use super::error::{Result, SecretsError};
use super::generate::{generate_password, PasswordSpec};

/// Configuration for the Vault backend.
#[derive(Debug, Clone)]
pub struct VaultStoreConfig {
    /// Vault server address.
    pub address: String,

    /// Authentication token.
    pub token: Option<String>,

    /// Optional namespace.
    pub namespace: Option<String>,

    /// KV v2 mount path.
    pub mount_path: String,
}

impl VaultStoreConfig {
    /// Load Vault configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| SecretsError::config_error("VAULT_ADDR is not set"))?;

        Ok(Self {
            address,
            token: std::env::var("VAULT_TOKEN").ok(),
            namespace: std::env::var("VAULT_NAMESPACE").ok(),
            mount_path: std::env::var("VAULT_MOUNT_PATH").unwrap_or_else(|_| "secret".to_string()),
        })
    }
}

/// Vault-backed [`SecretStore`] implementation.
pub struct VaultSecretStore {
    client: VaultClient,
    mount_path: String,
}

impl VaultSecretStore {
    /// Create a new Vault store and verify connectivity.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::ConfigError`] if the configuration is invalid
    /// - [`SecretsError::ConnectionFailed`] if Vault is unreachable
    pub async fn new(config: VaultStoreConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(namespace) = config.namespace.clone() {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::connection_failed(format!("Failed to create Vault client: {}", e))
        })?;

        match vaultrs::sys::health(&client).await {
            Ok(_) => {
                tracing::info!(address = %config.address, "Connected to Vault");
            }
            Err(e) => {
                tracing::error!(error = %e, address = %config.address, "Vault health check failed");
                return Err(SecretsError::connection_failed(format!(
                    "Vault health check failed: {}",
                    e
                )));
            }
        }

        Ok(Self { client, mount_path: config.mount_path })
    }

    async fn read_fields(&self, name: &str) -> Result<HashMap<String, String>> {
        kv2::read(&self.client, &self.mount_path, name).await.map_err(|e| map_read_error(name, e))
    }

    async fn write_fields(&self, name: &str, fields: &HashMap<String, String>) -> Result<()> {
        kv2::set(&self.client, &self.mount_path, name, fields).await.map_err(|e| {
            tracing::error!(error = %e, name = %name, "Failed to write secret to Vault");
            SecretsError::backend_error(format!("Failed to store secret '{}': {}", name, e))
        })?;
        Ok(())
    }

    fn template_fields(spec: &GeneratedSecretSpec) -> Result<HashMap<String, String>> {
        let serde_json::Value::Object(template) = &spec.template else {
            return Err(SecretsError::invalid_value("secret template must be a JSON object"));
        };

        let mut fields = HashMap::with_capacity(template.len() + 1);
        for (key, value) in template {
            let serde_json::Value::String(value) = value else {
                return Err(SecretsError::invalid_value(format!(
                    "template field '{key}' must be a string"
                )));
            };
            fields.insert(key.clone(), value.clone());
        }
        Ok(fields)
    }
}

fn map_read_error(name: &str, error: ClientError) -> SecretsError {
    match error {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(name),
        ClientError::APIError { code: 403, .. } => {
            SecretsError::access_denied(format!("read denied on secret '{}'", name))
        }
        other => {
            tracing::error!(error = %other, name = %name, "Failed to read secret from Vault");
            SecretsError::backend_error(format!("Failed to read secret '{}': {}", name, other))
        }
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String> {
        let fields = self.read_fields(name).await?;
        Ok(serde_json::to_string(&fields)?)
    }

    async fn create_secret(&self, name: &str, spec: &GeneratedSecretSpec) -> Result<()> {
        if self.secret_exists(name).await? {
            return Err(SecretsError::already_exists(name));
        }

        let mut fields = Self::template_fields(spec)?;
        let generated = generate_password(&spec.password)?;
        fields.insert(spec.generate_key.clone(), generated);

        self.write_fields(name, &fields).await?;
        tracing::info!(name = %name, mount_path = %self.mount_path, "Created secret in Vault");
        Ok(())
    }

    async fn rotate_field(&self, name: &str, key: &str, policy: &PasswordSpec) -> Result<String> {
        let mut fields = self.read_fields(name).await?;
        if !fields.contains_key(key) {
            return Err(SecretsError::invalid_value(format!(
                "secret '{name}' has no field '{key}' to rotate"
            )));
        }

        let generated = generate_password(policy)?;
        fields.insert(key.to_string(), generated.clone());
        self.write_fields(name, &fields).await?;

        tracing::info!(name = %name, field = %key, "Rotated secret field in Vault");
        Ok(generated)
    }

    async fn delete_secret(&self, name: &str) -> Result<()> {
        kv2::delete_metadata(&self.client, &self.mount_path, name).await.map_err(|e| {
            tracing::error!(error = %e, name = %name, "Failed to delete secret from Vault");
            SecretsError::backend_error(format!("Failed to delete secret '{}': {}", name, e))
        })?;

        tracing::info!(name = %name, mount_path = %self.mount_path, "Deleted secret from Vault");
        Ok(())
    }

    async fn secret_exists(&self, name: &str) -> Result<bool> {
        match kv2::read::<HashMap<String, String>>(&self.client, &self.mount_path, name).await {
            Ok(_) => Ok(true),
            Err(ClientError::APIError { code: 404, .. }) => Ok(false),
            Err(e) => Err(map_read_error(name, e)),
        }
    }

    async fn metadata(&self, name: &str) -> Result<SecretMetadata> {
        let metadata =
            kv2::read_metadata(&self.client, &self.mount_path, name).await.map_err(|e| match e {
                ClientError::APIError { code: 404, .. } => SecretsError::not_found(name),
                other => SecretsError::backend_error(format!(
                    "Failed to read metadata for '{}': {}",
                    name, other
                )),
            })?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&metadata.created_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let updated_at = chrono::DateTime::parse_from_rfc3339(&metadata.updated_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(created_at);

        Ok(SecretMetadata {
            name: name.to_string(),
            version: Some(metadata.current_version),
            created_at,
            updated_at,
        })
    }

    async fn grant_read(&self, name: &str, principal: &str) -> Result<()> {
        // Read-only ACL on the secret's data path; attaching the policy to
        // the principal's auth role is the operator's side of the contract.
        let policy_name = format!("{}-read-{}", principal, name);
        let policy = format!(
            "path \"{mount}/data/{name}\" {{\n  capabilities = [\"read\"]\n}}\n",
            mount = self.mount_path,
            name = name
        );

        vaultrs::sys::policy::set(&self.client, &policy_name, &policy).await.map_err(|e| {
            tracing::error!(error = %e, policy = %policy_name, "Failed to write read policy");
            SecretsError::backend_error(format!(
                "Failed to grant '{}' read on '{}': {}",
                principal, name, e
            ))
        })?;

        tracing::info!(name = %name, principal = %principal, policy = %policy_name, "Granted secret read access");
        Ok(())
    }
}
