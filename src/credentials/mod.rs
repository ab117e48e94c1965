//! Credential model, materialization and reference derivation.
//!
//! A service's database credential lives in exactly one secret:
//! `{user, database, host, password}`. This module owns its creation
//! ([`CredentialMaterializer`]), its typed representation
//! ([`AppCredential`], [`RootCredential`]), and the derivation of the two
//! reference forms consumers use to reach it without ever holding the value
//! ([`CredentialLocator`]).

pub mod locator;
pub mod materializer;
pub mod types;

pub use locator::{split_build_time_path, BuildTimeValue, CredentialLocator, RuntimeSecretRef};
pub use materializer::{CredentialMaterializer, MaterializeSpec};
pub use types::{AppCredential, RootCredential, SecretField};
