//! # HTTP surface
//!
//! Exposes the lifecycle invocation contract over HTTP for controllers
//! that deliver events as webhooks, plus a health probe. One route does
//! real work: `POST /v1/reconcile`.

pub mod routes;

pub use routes::{create_router, AppState};

use crate::errors::{Error, Result};

/// Bind and serve the router until the process is stopped.
pub async fn serve(state: AppState, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await.map_err(Error::Io)?;

    tracing::info!(bind_address = %bind_address, "Lifecycle endpoint listening");

    axum::serve(listener, create_router(state)).await.map_err(Error::Io)
}
