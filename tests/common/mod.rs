//! Shared test infrastructure: a stateful fake engine and store seeding.
//!
//! The fake engine models a database instance as plain state (databases,
//! users, grants) so protocol-level tests can assert final state instead of
//! call sequences: idempotence means "same state after one Create as after
//! two", rotation means "old password no longer authenticates".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rolesmith::credentials::RootCredential;
use rolesmith::engine::{EngineConnector, EngineKind, EngineSession, PrivilegeSet};
use rolesmith::errors::{Error, Result};
use rolesmith::secrets::InMemorySecretStore;

/// Observable state of the fake instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceState {
    pub databases: BTreeSet<String>,
    pub users: BTreeMap<String, String>,
    pub grants: BTreeMap<String, String>,
    pub flushes: usize,
}

/// A fake database instance shared between a connector and its sessions.
#[derive(Clone, Default)]
pub struct FakeInstance {
    state: Arc<Mutex<InstanceState>>,
    refuse_connections: Arc<Mutex<bool>>,
}

impl FakeInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InstanceState {
        self.state.lock().unwrap().clone()
    }

    pub fn refuse_connections(&self) {
        *self.refuse_connections.lock().unwrap() = true;
    }

    /// Whether `username`/`password` would authenticate against the fake.
    pub fn can_authenticate(&self, username: &str, password: &str) -> bool {
        self.state.lock().unwrap().users.get(username).map(String::as_str) == Some(password)
    }

    pub fn connector(&self) -> Arc<dyn EngineConnector> {
        Arc::new(FakeConnector { instance: self.clone() })
    }
}

struct FakeConnector {
    instance: FakeInstance,
}

#[async_trait]
impl EngineConnector for FakeConnector {
    fn kind(&self) -> EngineKind {
        EngineKind::MariaDb
    }

    async fn connect(&self, _root: &RootCredential) -> Result<Box<dyn EngineSession>> {
        if *self.instance.refuse_connections.lock().unwrap() {
            return Err(Error::connection("mariadb", "connection refused"));
        }
        Ok(Box::new(FakeSession { state: self.instance.state.clone() }))
    }
}

struct FakeSession {
    state: Arc<Mutex<InstanceState>>,
}

#[async_trait]
impl EngineSession for FakeSession {
    async fn ensure_database(&mut self, database: &str) -> Result<()> {
        self.state.lock().unwrap().databases.insert(database.to_string());
        Ok(())
    }

    async fn ensure_user(&mut self, username: &str, password: &str) -> Result<()> {
        self.state.lock().unwrap().users.insert(username.to_string(), password.to_string());
        Ok(())
    }

    async fn grant(
        &mut self,
        privileges: &PrivilegeSet,
        database: &str,
        username: &str,
    ) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .grants
            .insert(format!("{username}@{database}"), privileges.render());
        Ok(())
    }

    async fn post_grant_sync(&mut self) -> Result<()> {
        self.state.lock().unwrap().flushes += 1;
        Ok(())
    }

    async fn drop_user(&mut self, username: &str) -> Result<()> {
        // IF EXISTS semantics: absence is success.
        let mut state = self.state.lock().unwrap();
        state.users.remove(username);
        state.grants.retain(|grant, _| !grant.starts_with(&format!("{username}@")));
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Seed a store with the conventional root and app secrets used by the
/// protocol tests.
pub async fn seeded_store() -> Arc<InMemorySecretStore> {
    let store = Arc::new(InMemorySecretStore::new());
    store.seed("RootSecret", r#"{"username": "admin", "password": "rootpw"}"#).await;
    store
        .seed(
            "SvcADbUser",
            r#"{"user": "svc_a", "database": "svc_a_db", "host": "db.internal", "password": "initial-pw"}"#,
        )
        .await;
    store
}
