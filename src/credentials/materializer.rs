//! Credential materialization.
//!
//! Creates the per-service app credential secret up front, before any
//! lifecycle event fires: a `{user, database, host}` template plus a
//! store-generated `password`. Materialization is idempotent at the
//! infrastructure level: re-running against an existing name returns the
//! existing secret and never regenerates an established password.

use std::sync::Arc;

use serde_json::json;

use crate::errors::{Error, Result};
use crate::secrets::{GeneratedSecretSpec, SecretStore, SecretsError};

use super::types::{AppCredential, SecretField};

/// Desired shape of a service's app credential.
#[derive(Debug, Clone)]
pub struct MaterializeSpec {
    /// Owning service name (used in logs only).
    pub service: String,

    /// Secret name, conventionally `{Service}DbUser`.
    pub secret_name: String,

    /// Database login to issue.
    pub username: String,

    /// Database the login owns.
    pub database: String,

    /// Instance hostname the login connects to.
    pub host: String,

    /// Principals granted read access to the secret: the reconciler's
    /// execution identity plus any declared consumer.
    pub readers: Vec<String>,
}

/// Materializes app credential secrets in a [`SecretStore`].
pub struct CredentialMaterializer {
    store: Arc<dyn SecretStore>,
}

impl CredentialMaterializer {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Ensure the app credential secret exists and return its contents.
    ///
    /// Creates the secret with a generated password if absent; fetches the
    /// existing one otherwise. Read grants are applied on every call (they
    /// are idempotent) so newly declared consumers pick up access on the
    /// next deployment.
    pub async fn materialize(&self, spec: &MaterializeSpec) -> Result<AppCredential> {
        let name = spec.secret_name.as_str();

        let existed = self
            .store
            .secret_exists(name)
            .await
            .map_err(|e| Error::secret_retrieval(name, e))?;

        if existed {
            tracing::info!(service = %spec.service, secret = %name, "App credential secret already materialized");
        } else {
            self.create(spec).await?;
        }

        for principal in &spec.readers {
            self.store
                .grant_read(name, principal)
                .await
                .map_err(|e| Error::secret_creation(name, e))?;
        }

        let blob = self
            .store
            .get_secret(name)
            .await
            .map_err(|e| Error::secret_retrieval(name, e))?;
        AppCredential::from_json(&blob)
    }

    async fn create(&self, spec: &MaterializeSpec) -> Result<()> {
        let secret_spec = GeneratedSecretSpec::new(
            json!({
                "user": spec.username,
                "database": spec.database,
                "host": spec.host,
            }),
            SecretField::Password.key(),
        );

        match self.store.create_secret(&spec.secret_name, &secret_spec).await {
            Ok(()) => {
                tracing::info!(
                    service = %spec.service,
                    secret = %spec.secret_name,
                    username = %spec.username,
                    database = %spec.database,
                    "Materialized app credential secret"
                );
                Ok(())
            }
            // Lost a creation race with a concurrent deployment; the winner's
            // password stands.
            Err(SecretsError::AlreadyExists { .. }) => {
                tracing::info!(secret = %spec.secret_name, "Secret created concurrently, reusing");
                Ok(())
            }
            Err(e) => Err(Error::secret_creation(&spec.secret_name, e)),
        }
    }
}
