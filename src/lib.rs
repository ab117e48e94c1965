//! # rolesmith
//!
//! Database credential reconciliation for service platforms. An external
//! infrastructure-lifecycle controller invokes rolesmith once per
//! deployment with a Create/Update/Delete event; rolesmith brings the
//! per-service database user on a live PostgreSQL or MariaDB instance into
//! the desired state (database present, user present with the current
//! password, privileges granted) idempotently, tolerating partial prior
//! state, and makes the credential discoverable through build-time secret
//! paths and runtime secret references without ever handing out the value
//! at configuration time.
//!
//! ## Architecture
//!
//! ```text
//! Lifecycle controller → Protocol Handler → Engine Reconciler → live database
//!                              ↓                  ↑
//!                         Secret Store ← Credential Materializer
//!                              ↓
//!                       Credential Locator → CI build / container runtime
//! ```
//!
//! ## Core components
//!
//! - [`lifecycle`]: the Create/Update/Delete contract and its handler
//! - [`engine`]: dialect sessions and the reconciliation driver
//! - [`secrets`]: the secret store abstraction (Vault, in-memory)
//! - [`credentials`]: credential model, materialization, reference derivation
//! - [`api`]: HTTP exposure of the lifecycle contract

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod observability;
pub mod secrets;

// Re-export commonly used types
pub use config::Settings;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
