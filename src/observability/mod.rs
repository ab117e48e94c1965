//! # Observability Infrastructure
//!
//! Structured logging for the rolesmith service via the tracing ecosystem.
//! Reconciliation touches live credentials, so log output policy matters:
//! secret values never appear in fields (the `SecretString` wrapper redacts
//! them even under `{:?}`), while every lifecycle decision is logged with
//! structured context.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level so operators can
/// raise verbosity per-target without a config change. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_format {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(
        log_level = %config.log_level,
        json_format = config.json_format,
        "Observability initialized"
    );
    Ok(())
}
