//! # Configuration Management
//!
//! Environment-driven configuration for the rolesmith service. See
//! [`Settings::from_env`] for the full variable list; every section has
//! workable defaults for local development.

pub mod settings;

pub use settings::{
    ApiConfig, EngineConfig, ObservabilityConfig, SecretBackend, SecretsConfig, Settings,
};
