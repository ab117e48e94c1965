//! Credential reference derivation.
//!
//! Downstream consumers never receive the credential's value at
//! configuration time. They receive references bound to the secret's
//! identity, dereferenced later by whichever resolver runs with read
//! access:
//!
//! - **build-time paths**: `"{secretName}:{fieldKey}"` strings, resolved by
//!   the CI build-variable resolver when a build starts;
//! - **runtime refs**: opaque handles injected by the container
//!   orchestrator at task start.
//!
//! Both forms address the same stored secret, so a rotated password is
//! visible through either with no synchronization step. The locator itself
//! only ever manipulates names and keys, never plaintext.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::EngineKind;

use super::types::SecretField;

/// Opaque handle to one field of a secret, resolved by the container
/// runtime at task start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeSecretRef {
    secret_name: String,
    field_key: &'static str,
}

impl RuntimeSecretRef {
    /// Name of the secret this handle is bound to.
    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    /// Field key this handle resolves.
    pub fn field_key(&self) -> &str {
        self.field_key
    }
}

/// One entry of the build environment: either a secret-resolved path or a
/// plain constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BuildTimeValue {
    /// Resolved by the build-time secret resolver from a `name:key` path.
    Secret(String),
    /// Passed through verbatim.
    Plain(String),
}

/// Derives both credential reference forms from a secret identity.
#[derive(Debug, Clone)]
pub struct CredentialLocator {
    secret_name: String,
    engine: EngineKind,
}

impl CredentialLocator {
    pub fn new(secret_name: impl Into<String>, engine: EngineKind) -> Self {
        Self { secret_name: secret_name.into(), engine }
    }

    /// The fixed port for this engine dialect. Supplied out-of-band, never
    /// stored in the secret.
    pub fn port(&self) -> u16 {
        match self.engine {
            EngineKind::Postgres => 5432,
            EngineKind::MariaDb => 3306,
        }
    }

    /// Whether consumers must connect over TLS. Fixed policy.
    pub fn tls_required(&self) -> bool {
        true
    }

    /// Build-time path for one field: `"{secretName}:{fieldKey}"`.
    pub fn build_time_path(&self, field: SecretField) -> String {
        format!("{}:{}", self.secret_name, field.key())
    }

    /// Runtime handle for one field.
    pub fn runtime_ref(&self, field: SecretField) -> RuntimeSecretRef {
        RuntimeSecretRef { secret_name: self.secret_name.clone(), field_key: field.key() }
    }

    /// The conventional build environment for a service consuming this
    /// credential: secret-resolved `DB_*` variables plus the constant port
    /// and TLS flag.
    pub fn build_environment(&self) -> BTreeMap<&'static str, BuildTimeValue> {
        let mut env = BTreeMap::new();
        env.insert("DB_USER", BuildTimeValue::Secret(self.build_time_path(SecretField::User)));
        env.insert(
            "DB_PASSWORD",
            BuildTimeValue::Secret(self.build_time_path(SecretField::Password)),
        );
        env.insert(
            "DB_DATABASE",
            BuildTimeValue::Secret(self.build_time_path(SecretField::Database)),
        );
        env.insert("DB_HOST", BuildTimeValue::Secret(self.build_time_path(SecretField::Host)));
        env.insert("DB_PORT", BuildTimeValue::Plain(self.port().to_string()));
        env.insert("DB_SSL", BuildTimeValue::Plain(self.tls_required().to_string()));
        env
    }

    /// The conventional runtime secret injection map for a container task.
    pub fn runtime_secrets(&self) -> BTreeMap<&'static str, RuntimeSecretRef> {
        let mut secrets = BTreeMap::new();
        secrets.insert("DB_USER", self.runtime_ref(SecretField::User));
        secrets.insert("DB_PASSWORD", self.runtime_ref(SecretField::Password));
        secrets.insert("DB_DATABASE", self.runtime_ref(SecretField::Database));
        secrets.insert("DB_HOST", self.runtime_ref(SecretField::Host));
        secrets
    }
}

/// Split a build-time path back into `(secret_name, field_key)`.
///
/// The split is on the last colon: secret names may themselves contain
/// colons in some stores, field keys never do.
pub fn split_build_time_path(path: &str) -> Option<(&str, &str)> {
    let (name, key) = path.rsplit_once(':')?;
    if name.is_empty() || key.is_empty() {
        return None;
    }
    Some((name, key))
}
