//! Random password generation for store-managed secret fields.
//!
//! Every backend generates field values through this module so the exclusion
//! policy is identical regardless of where the secret is persisted. The
//! default policy excludes quotes, slashes, the at-sign and all punctuation:
//! the generated value must be safe to embed in connection strings and in
//! shell-invoked SQL statements without escaping.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{Result, SecretsError};

/// Default generated password length.
const DEFAULT_LENGTH: usize = 32;

/// Characters excluded by default, on top of the punctuation exclusion.
const DEFAULT_EXCLUDE: &str = "\"@/\\";

/// Generation policy for a random secret field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PasswordSpec {
    /// Number of characters to generate.
    pub length: usize,

    /// Characters that must never appear in the generated value.
    pub exclude_characters: String,

    /// Exclude every ASCII punctuation character.
    pub exclude_punctuation: bool,
}

impl Default for PasswordSpec {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            exclude_characters: DEFAULT_EXCLUDE.to_string(),
            exclude_punctuation: true,
        }
    }
}

impl PasswordSpec {
    /// The candidate alphabet after applying the exclusion policy.
    fn alphabet(&self) -> Vec<char> {
        (b'!'..=b'~')
            .map(char::from)
            .filter(|c| !self.exclude_characters.contains(*c))
            .filter(|c| !(self.exclude_punctuation && c.is_ascii_punctuation()))
            .collect()
    }
}

/// Generate a random password under the given policy.
///
/// Uses the thread-local CSPRNG. Fails with [`SecretsError::InvalidValue`]
/// if the policy excludes every candidate character or requests an empty
/// value.
pub fn generate_password(spec: &PasswordSpec) -> Result<String> {
    if spec.length == 0 {
        return Err(SecretsError::invalid_value("generated password length must be non-zero"));
    }

    let alphabet = spec.alphabet();
    if alphabet.is_empty() {
        return Err(SecretsError::invalid_value(
            "password exclusion policy leaves no candidate characters",
        ));
    }

    let mut rng = rand::thread_rng();
    let password = (0..spec.length).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect();

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_excludes_forbidden_characters() {
        let spec = PasswordSpec::default();
        for _ in 0..50 {
            let password = generate_password(&spec).unwrap();
            assert_eq!(password.len(), 32);
            for c in password.chars() {
                assert!(c.is_ascii_alphanumeric(), "unexpected character: {c:?}");
            }
        }
    }

    #[test]
    fn test_explicit_exclusions_respected_without_punctuation_filter() {
        let spec = PasswordSpec {
            length: 64,
            exclude_characters: "\"@/\\'`".to_string(),
            exclude_punctuation: false,
        };
        for _ in 0..50 {
            let password = generate_password(&spec).unwrap();
            for excluded in spec.exclude_characters.chars() {
                assert!(!password.contains(excluded), "found excluded {excluded:?}");
            }
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        let spec = PasswordSpec { length: 0, ..Default::default() };
        assert!(matches!(generate_password(&spec), Err(SecretsError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_alphabet_rejected() {
        let spec = PasswordSpec {
            length: 8,
            exclude_characters: (b'!'..=b'~').map(char::from).collect(),
            exclude_punctuation: true,
        };
        assert!(matches!(generate_password(&spec), Err(SecretsError::InvalidValue { .. })));
    }

    #[test]
    fn test_generated_values_differ() {
        let spec = PasswordSpec::default();
        let a = generate_password(&spec).unwrap();
        let b = generate_password(&spec).unwrap();
        assert_ne!(a, b);
    }
}
