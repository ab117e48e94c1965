//! Secret store abstraction.
//!
//! Secrets are opaque JSON blobs addressed by name. The [`SecretStore`]
//! trait covers the operations the credential subsystem needs: fetch,
//! create-with-generated-field, single-field rotation, deletion, and read
//! grants for consuming principals.
//!
//! # Supported backends
//!
//! - **HashiCorp Vault** ([`VaultSecretStore`]): production backend on the
//!   KV v2 engine, with versioning and policy-based read grants.
//! - **In-memory** ([`InMemorySecretStore`]): development and test backend.
//!
//! Both backends generate random field values through [`generate`], so the
//! character-exclusion policy for passwords is identical everywhere.

pub mod client;
pub mod error;
pub mod generate;
pub mod memory;
pub mod types;
pub mod vault;

pub use client::{GeneratedSecretSpec, SecretMetadata, SecretStore};
pub use error::{Result, SecretsError};
pub use generate::{generate_password, PasswordSpec};
pub use memory::InMemorySecretStore;
pub use types::SecretString;
pub use vault::{VaultSecretStore, VaultStoreConfig};
