//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secret store operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while talking to a secret store backend.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the backend.
    #[error("Secret not found: {name}")]
    NotFound { name: String },

    /// A secret with this name already exists (creation collision).
    #[error("Secret already exists: {name}")]
    AlreadyExists { name: String },

    /// Failed to connect to the secret store backend.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The backend rejected the caller's credentials or the caller lacks
    /// permission on the secret.
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Secret value or generation spec validation failed.
    #[error("Invalid secret value: {reason}")]
    InvalidValue { reason: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an already exists error.
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an access denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied { message: message.into() }
    }

    /// Create an invalid value error.
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue { reason: reason.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = SecretsError::not_found("AppDbUser");
        assert!(matches!(err, SecretsError::NotFound { .. }));
        assert_eq!(err.to_string(), "Secret not found: AppDbUser");

        let err = SecretsError::already_exists("AppDbUser");
        assert!(matches!(err, SecretsError::AlreadyExists { .. }));

        let err = SecretsError::access_denied("token expired");
        assert!(err.to_string().contains("token expired"));
    }
}
