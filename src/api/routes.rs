//! HTTP routing for the lifecycle contract.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::lifecycle::{LifecycleHandler, LifecycleRequest, LifecycleResponse};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<LifecycleHandler>,
}

impl AppState {
    pub fn new(handler: Arc<LifecycleHandler>) -> Self {
        Self { handler }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/reconcile", post(reconcile))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// One lifecycle invocation. Always HTTP 200: the `status` field is the
/// protocol, and the external controller reads the body, not the transport
/// status.
async fn reconcile(
    State(state): State<AppState>,
    Json(request): Json<LifecycleRequest>,
) -> Json<LifecycleResponse> {
    Json(state.handler.handle(request).await)
}
