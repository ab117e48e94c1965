//! # Error Types
//!
//! Crate-wide error taxonomy for rolesmith, built with `thiserror`.
//!
//! The lifecycle handler is the only consumer that flattens these into a
//! wire status; everything below it propagates `Result` with `?`.

use crate::secrets::SecretsError;

/// Custom result type for rolesmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the credential reconciliation service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Secret store unreachable or access denied while fetching an existing
    /// secret. Always raised before any database mutation.
    #[error("Failed to retrieve secret '{name}'")]
    SecretRetrieval {
        name: String,
        #[source]
        source: SecretsError,
    },

    /// Secret store rejected materialization of a new secret.
    #[error("Failed to create secret '{name}'")]
    SecretCreation {
        name: String,
        #[source]
        source: SecretsError,
    },

    /// Target engine unreachable or root credentials rejected. Fatal for the
    /// invocation; the external controller owns retry.
    #[error("Connection to {engine} instance failed: {message}")]
    Connection { engine: String, message: String },

    /// Bounded dial expired before the engine accepted the connection.
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// DDL/DML failure during Create/Update. Partial state is possible and
    /// must be re-driveable by a subsequent Create/Update.
    #[error("Reconciliation failed during {operation}")]
    Reconciliation {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a secret retrieval error
    pub fn secret_retrieval(name: impl Into<String>, source: SecretsError) -> Self {
        Self::SecretRetrieval { name: name.into(), source }
    }

    /// Create a secret creation error
    pub fn secret_creation(name: impl Into<String>, source: SecretsError) -> Self {
        Self::SecretCreation { name: name.into(), source }
    }

    /// Create a connection error
    pub fn connection(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection { engine: engine.into(), message: message.into() }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a reconciliation error
    pub fn reconciliation(operation: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Reconciliation { operation: operation.into(), source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization { context: context.into(), source }
    }

    /// Whether the invocation failed before touching the target engine.
    /// Pre-mutation failures are always safe to re-drive.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Error::SecretRetrieval { .. }
                | Error::SecretCreation { .. }
                | Error::Connection { .. }
                | Error::Timeout { .. }
                | Error::Config { .. }
                | Error::Validation { .. }
        )
    }
}
