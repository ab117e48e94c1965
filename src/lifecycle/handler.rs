//! The reconciliation protocol handler.
//!
//! Adapts one lifecycle invocation into one engine reconciliation: fetch
//! the root and app credentials from the secret store, drive the engine,
//! and flatten every outcome into the `{status}` response the external
//! controller understands. The handler is stateless across invocations and
//! never retries; retry and backoff policy belong to the controller.

use std::sync::Arc;

use crate::credentials::{AppCredential, RootCredential};
use crate::engine::{self, EngineConnector, PrivilegeSet};
use crate::errors::{Error, Result};
use crate::secrets::SecretStore;

use super::types::{LifecycleRequest, LifecycleResponse};

/// Handles lifecycle invocations for one declared credential resource.
pub struct LifecycleHandler {
    store: Arc<dyn SecretStore>,
    connector: Arc<dyn EngineConnector>,
    root_secret_name: String,
    app_secret_name: String,
    privileges: PrivilegeSet,
}

impl LifecycleHandler {
    pub fn new(
        store: Arc<dyn SecretStore>,
        connector: Arc<dyn EngineConnector>,
        root_secret_name: impl Into<String>,
        app_secret_name: impl Into<String>,
        privileges: PrivilegeSet,
    ) -> Self {
        Self {
            store,
            connector,
            root_secret_name: root_secret_name.into(),
            app_secret_name: app_secret_name.into(),
            privileges,
        }
    }

    /// Process one invocation. Infallible at the type level: every error is
    /// flattened into `{status: FAILED}` with a surfaced payload.
    pub async fn handle(&self, request: LifecycleRequest) -> LifecycleResponse {
        tracing::info!(
            request_type = ?request.request_type,
            engine = %self.connector.kind(),
            app_secret = %self.app_secret_name,
            "Handling lifecycle request"
        );

        match self.try_handle(&request).await {
            Ok(()) => {
                tracing::info!(request_type = ?request.request_type, "Reconciliation succeeded");
                LifecycleResponse::success()
            }
            Err(e) => {
                tracing::error!(
                    request_type = ?request.request_type,
                    error = %e,
                    pre_mutation = e.is_pre_mutation(),
                    "Reconciliation failed"
                );
                LifecycleResponse::failed(e.to_string())
            }
        }
    }

    async fn try_handle(&self, request: &LifecycleRequest) -> Result<()> {
        let (root_blob, app_blob) = tokio::try_join!(
            self.fetch(&self.root_secret_name),
            self.fetch(&self.app_secret_name),
        )?;

        let root = RootCredential::from_json(&root_blob)?;
        let app = AppCredential::from_json(&app_blob)?;

        engine::reconcile(
            self.connector.as_ref(),
            request.request_type.engine_action(),
            &root,
            &app,
            &self.privileges,
        )
        .await
    }

    async fn fetch(&self, name: &str) -> Result<String> {
        self.store
            .get_secret(name)
            .await
            .map_err(|e| Error::secret_retrieval(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineKind, EngineSession};
    use crate::lifecycle::types::{ReconcileStatus, RequestType, ResourceProperties};
    use crate::secrets::InMemorySecretStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoopSession {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EngineSession for NoopSession {
        async fn ensure_database(&mut self, database: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("ensure_database({database})"));
            Ok(())
        }

        async fn ensure_user(&mut self, username: &str, _password: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("ensure_user({username})"));
            Ok(())
        }

        async fn grant(
            &mut self,
            _privileges: &PrivilegeSet,
            database: &str,
            username: &str,
        ) -> Result<()> {
            self.log.lock().unwrap().push(format!("grant({database},{username})"));
            Ok(())
        }

        async fn post_grant_sync(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("post_grant_sync".to_string());
            Ok(())
        }

        async fn drop_user(&mut self, username: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("drop_user({username})"));
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.log.lock().unwrap().push("close".to_string());
            Ok(())
        }
    }

    struct StubConnector {
        log: Arc<Mutex<Vec<String>>>,
        refuse: bool,
    }

    impl StubConnector {
        fn new() -> Self {
            Self { log: Arc::new(Mutex::new(Vec::new())), refuse: false }
        }

        fn refusing() -> Self {
            Self { log: Arc::new(Mutex::new(Vec::new())), refuse: true }
        }
    }

    #[async_trait]
    impl EngineConnector for StubConnector {
        fn kind(&self) -> EngineKind {
            EngineKind::MariaDb
        }

        async fn connect(&self, _root: &RootCredential) -> Result<Box<dyn EngineSession>> {
            if self.refuse {
                return Err(Error::connection("mariadb", "connection refused"));
            }
            Ok(Box::new(NoopSession { log: self.log.clone() }))
        }
    }

    async fn seeded_store() -> Arc<InMemorySecretStore> {
        let store = Arc::new(InMemorySecretStore::new());
        store.seed("RootSecret", r#"{"username": "admin", "password": "rootpw"}"#).await;
        store
            .seed(
                "SvcADbUser",
                r#"{"user": "svc_a", "database": "svc_a_db", "host": "db.internal", "password": "apppw"}"#,
            )
            .await;
        store
    }

    fn request(request_type: RequestType, token: &str) -> LifecycleRequest {
        LifecycleRequest {
            request_type,
            resource_properties: ResourceProperties { forcing_token: Some(token.to_string()) },
        }
    }

    #[tokio::test]
    async fn test_create_succeeds_and_drives_engine() {
        let store = seeded_store().await;
        let connector = Arc::new(StubConnector::new());
        let log = connector.log.clone();
        let handler = LifecycleHandler::new(
            store,
            connector,
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        let response = handler.handle(request(RequestType::Create, "t1")).await;
        assert_eq!(response.status, ReconcileStatus::Success);
        assert!(response.error.is_none());
        assert_eq!(
            log.lock().unwrap().as_slice(),
            [
                "ensure_database(svc_a_db)",
                "ensure_user(svc_a)",
                "grant(svc_a_db,svc_a)",
                "post_grant_sync",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn test_forcing_token_never_changes_behavior() {
        let store = seeded_store().await;
        let connector = Arc::new(StubConnector::new());
        let log = connector.log.clone();
        let handler = LifecycleHandler::new(
            store,
            connector,
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        handler.handle(request(RequestType::Update, "2024-06-01T10:00:00Z")).await;
        let first = log.lock().unwrap().clone();
        log.lock().unwrap().clear();
        handler.handle(request(RequestType::Update, "2024-06-02T10:00:00Z")).await;

        assert_eq!(*log.lock().unwrap(), first);
    }

    #[tokio::test]
    async fn test_missing_secret_fails_before_engine() {
        let store = Arc::new(InMemorySecretStore::new());
        store.seed("RootSecret", r#"{"username": "admin", "password": "rootpw"}"#).await;
        let connector = Arc::new(StubConnector::new());
        let log = connector.log.clone();
        let handler = LifecycleHandler::new(
            store,
            connector,
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        let response = handler.handle(request(RequestType::Create, "t")).await;
        assert_eq!(response.status, ReconcileStatus::Failed);
        assert!(response.error.unwrap().contains("SvcADbUser"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_failed() {
        let store = seeded_store().await;
        let handler = LifecycleHandler::new(
            store,
            Arc::new(StubConnector::refusing()),
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        let response = handler.handle(request(RequestType::Create, "t")).await;
        assert_eq!(response.status, ReconcileStatus::Failed);
        assert!(response.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_app_secret_maps_to_failed() {
        let store = Arc::new(InMemorySecretStore::new());
        store.seed("RootSecret", r#"{"username": "admin", "password": "rootpw"}"#).await;
        store.seed("SvcADbUser", "not json").await;
        let handler = LifecycleHandler::new(
            store,
            Arc::new(StubConnector::new()),
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        let response = handler.handle(request(RequestType::Create, "t")).await;
        assert_eq!(response.status, ReconcileStatus::Failed);
    }

    #[tokio::test]
    async fn test_delete_drops_user_only() {
        let store = seeded_store().await;
        let connector = Arc::new(StubConnector::new());
        let log = connector.log.clone();
        let handler = LifecycleHandler::new(
            store,
            connector,
            "RootSecret",
            "SvcADbUser",
            PrivilegeSet::All,
        );

        let response = handler.handle(request(RequestType::Delete, "t")).await;
        assert_eq!(response.status, ReconcileStatus::Success);
        assert_eq!(log.lock().unwrap().as_slice(), ["drop_user(svc_a)", "close"]);
    }
}
