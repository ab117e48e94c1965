//! Credential data model.

use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::secrets::SecretString;

/// Administrative login of a database instance.
///
/// Owned by the instance, created outside this system, read-only to
/// reconcilers, never rotated here. Deserialized from the root secret's
/// JSON blob.
#[derive(Debug, Clone, Deserialize)]
pub struct RootCredential {
    /// Administrative username.
    pub username: String,

    /// Administrative password.
    pub password: SecretString,
}

impl RootCredential {
    /// Parse a root credential from its secret blob.
    pub fn from_json(blob: &str) -> Result<Self> {
        serde_json::from_str(blob)
            .map_err(|e| Error::serialization("root credential secret blob", e))
    }
}

/// The restricted-privilege login issued to one service.
///
/// Exactly one exists per (service, engine) pair. `user`, `database` and
/// `host` are fixed at creation; `password` is the only field ever rotated.
#[derive(Debug, Clone, Deserialize)]
pub struct AppCredential {
    /// Database login name.
    pub user: String,

    /// Database owned by the service.
    pub database: String,

    /// Instance hostname.
    pub host: String,

    /// Current password.
    pub password: SecretString,
}

impl AppCredential {
    /// Parse an app credential from its secret blob.
    pub fn from_json(blob: &str) -> Result<Self> {
        serde_json::from_str(blob)
            .map_err(|e| Error::serialization("app credential secret blob", e))
    }
}

/// The four fields of an app credential secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretField {
    User,
    Password,
    Database,
    Host,
}

impl SecretField {
    /// All fields, in the order consumers conventionally list them.
    pub const ALL: [SecretField; 4] =
        [SecretField::User, SecretField::Password, SecretField::Database, SecretField::Host];

    /// The JSON key of this field inside the secret blob.
    pub fn key(&self) -> &'static str {
        match self {
            SecretField::User => "user",
            SecretField::Password => "password",
            SecretField::Database => "database",
            SecretField::Host => "host",
        }
    }
}

impl std::fmt::Display for SecretField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
