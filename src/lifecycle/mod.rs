//! Lifecycle protocol adaptation.
//!
//! The boundary with the external infrastructure-lifecycle controller: one
//! `Create`/`Update`/`Delete` request in, one `{status}` response out,
//! synchronously, once per deployment per declared resource.

pub mod handler;
pub mod types;

pub use handler::LifecycleHandler;
pub use types::{
    LifecycleRequest, LifecycleResponse, ReconcileStatus, RequestType, ResourceProperties,
};
