//! Wire types for the lifecycle invocation contract.
//!
//! The external lifecycle controller invokes the handler once per
//! deployment per declared resource, and reads only the `status` field of
//! the response to decide whether dependent resources may proceed.

use serde::{Deserialize, Serialize};

use crate::engine::EngineAction;

/// Lifecycle request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    /// The engine action this request drives. Create and Update are
    /// identical by design: the reconciler is idempotent, not create-once.
    pub fn engine_action(&self) -> EngineAction {
        match self {
            RequestType::Create | RequestType::Update => EngineAction::Ensure,
            RequestType::Delete => EngineAction::Remove,
        }
    }
}

/// Declared properties of the reconciliation resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProperties {
    /// Opaque value that changes on every deployment (e.g. a timestamp).
    /// Its only purpose is to defeat the controller's declared-state
    /// diffing so the handler runs on every deploy; it is never
    /// interpreted.
    #[serde(default)]
    pub forcing_token: Option<String>,
}

/// One lifecycle invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRequest {
    pub request_type: RequestType,

    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

/// Invocation outcome as the controller reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcileStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Synchronous response to one lifecycle invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleResponse {
    pub status: ReconcileStatus,

    /// Surfaced error payload on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LifecycleResponse {
    pub fn success() -> Self {
        Self { status: ReconcileStatus::Success, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: ReconcileStatus::Failed, error: Some(error.into()) }
    }
}
