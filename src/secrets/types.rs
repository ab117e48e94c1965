//! Shared value types for the secrets module.

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that is zeroed on drop and redacted in debug output.
///
/// Wrap any plaintext credential material that has to transit application
/// memory (passwords pulled from the store, generated field values) so an
/// accidental `{:?}` can never leak it into logs.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a plaintext secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the plaintext. Call sites should keep the borrow short-lived.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the underlying value without exposing it.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the underlying value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(\"***\")")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Deserialize only. `Serialize` is deliberately not implemented so a wrapped
// secret can never ride out through a serialized response or log payload.
impl<'de> serde::Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        // Not constant-time; these are compared in tests, never for auth.
        self.0 == other.0
    }
}
