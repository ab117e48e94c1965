//! Engine reconciliation.
//!
//! Brings a target database instance to the desired state for one service:
//! database present, user present with the current password, privileges
//! granted, or, on removal, the user gone. Dialect differences live behind
//! the [`EngineSession`] capability trait (`ensure_database`, `ensure_user`,
//! `grant`, `post_grant_sync`, `drop_user`), with one implementation per
//! supported engine selected by the [`EngineKind`] configuration tag.
//!
//! Each invocation opens exactly one root-credentialed connection, scoped
//! to the invocation: the [`reconcile`] driver closes the session on every
//! exit path, and the session owns its connection so an externally aborted
//! invocation drops it. Nothing is retried here (the external lifecycle
//! controller owns retry policy), but the dial is bounded so a hung
//! instance cannot stall the controller indefinitely.

pub mod mysql;
pub mod postgres;
pub mod sql;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::{AppCredential, RootCredential};
use crate::errors::{Error, Result};

pub use mysql::MariaDbSession;
pub use postgres::PostgresSession;

/// Supported database engine dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Postgres,
    MariaDb,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::MariaDb => "mariadb",
        }
    }

    /// The dialect's conventional port.
    pub fn default_port(&self) -> u16 {
        match self {
            EngineKind::Postgres => 5432,
            EngineKind::MariaDb => 3306,
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(EngineKind::Postgres),
            "mariadb" | "mysql" => Ok(EngineKind::MariaDb),
            other => Err(Error::config(format!("Unknown engine kind: {}", other))),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The privilege set granted to the app user on its database.
///
/// Configured per deployment rather than hard-coded: full privileges for a
/// service that owns its schema, or a narrowed statement list. Entries are
/// validated against a keyword shape before they are rendered into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeSet {
    /// `ALL PRIVILEGES`.
    All,
    /// An explicit privilege keyword list, e.g. `SELECT, INSERT, UPDATE`.
    Only(Vec<String>),
}

impl PrivilegeSet {
    /// Build a restricted set from privilege keywords.
    pub fn only<I, S>(privileges: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = Vec::new();
        for privilege in privileges {
            let entry = privilege.as_ref().trim().to_ascii_uppercase();
            if entry.is_empty() {
                continue;
            }
            if !entry.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
                return Err(Error::validation(format!(
                    "Invalid privilege keyword: {:?}",
                    privilege.as_ref()
                )));
            }
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err(Error::validation("Privilege list cannot be empty"));
        }
        Ok(PrivilegeSet::Only(entries))
    }

    /// Parse deployment configuration: `"ALL"` or a comma-separated list.
    pub fn from_config(raw: &str) -> Result<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(PrivilegeSet::All);
        }
        Self::only(raw.split(','))
    }

    /// Render for interpolation into a grant statement.
    pub fn render(&self) -> String {
        match self {
            PrivilegeSet::All => "ALL PRIVILEGES".to_string(),
            PrivilegeSet::Only(entries) => entries.join(", "),
        }
    }
}

/// What one reconciliation should leave behind.
///
/// Create and Update collapse to [`Ensure`]: the reconciler is idempotent,
/// not create-once, so both drive toward the same state.
///
/// [`Ensure`]: EngineAction::Ensure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    /// Database exists, user exists with the current password, privileges
    /// granted.
    Ensure,
    /// User removed, best-effort.
    Remove,
}

/// Dialect capability set, exercised over one open root session.
#[async_trait]
pub trait EngineSession: Send {
    /// Ensure the target database exists, tolerating prior existence and
    /// concurrent creation.
    async fn ensure_database(&mut self, database: &str) -> Result<()>;

    /// Ensure the user exists and authenticates with exactly this password,
    /// whether or not it existed before.
    async fn ensure_user(&mut self, username: &str, password: &str) -> Result<()>;

    /// Grant the configured privileges on the database to the user.
    async fn grant(
        &mut self,
        privileges: &PrivilegeSet,
        database: &str,
        username: &str,
    ) -> Result<()>;

    /// Dialect-specific cache invalidation after grants, if any.
    async fn post_grant_sync(&mut self) -> Result<()>;

    /// Remove the user, best-effort. A user that is already absent is
    /// success, not failure.
    async fn drop_user(&mut self, username: &str) -> Result<()>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens dialect sessions. The seam between the protocol handler and live
/// engines; tests substitute a recording implementation.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    fn kind(&self) -> EngineKind;

    async fn connect(&self, root: &RootCredential) -> Result<Box<dyn EngineSession>>;
}

/// Production connector: dials the configured instance with a bounded
/// timeout and hands back the dialect session for [`EngineKind`].
pub struct SqlEngineConnector {
    kind: EngineKind,
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl SqlEngineConnector {
    pub fn new(
        kind: EngineKind,
        host: impl Into<String>,
        port: Option<u16>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            kind,
            host: host.into(),
            port: port.unwrap_or_else(|| kind.default_port()),
            connect_timeout,
        }
    }
}

#[async_trait]
impl EngineConnector for SqlEngineConnector {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn connect(&self, root: &RootCredential) -> Result<Box<dyn EngineSession>> {
        let dial = async {
            let session: Box<dyn EngineSession> = match self.kind {
                EngineKind::Postgres => {
                    Box::new(PostgresSession::connect(&self.host, self.port, root).await?)
                }
                EngineKind::MariaDb => {
                    Box::new(MariaDbSession::connect(&self.host, self.port, root).await?)
                }
            };
            Ok(session)
        };

        tokio::time::timeout(self.connect_timeout, dial).await.map_err(|_| {
            Error::timeout(
                format!("{} connect to {}:{}", self.kind, self.host, self.port),
                self.connect_timeout.as_millis() as u64,
            )
        })?
    }
}

/// Drive one reconciliation: open a session, apply the action, release the
/// session on every exit path.
pub async fn reconcile(
    connector: &dyn EngineConnector,
    action: EngineAction,
    root: &RootCredential,
    app: &AppCredential,
    privileges: &PrivilegeSet,
) -> Result<()> {
    let mut session = connector.connect(root).await?;

    let outcome = match action {
        EngineAction::Ensure => ensure(session.as_mut(), app, privileges).await,
        EngineAction::Remove => session.drop_user(&app.user).await,
    };

    let released = session.close().await;
    outcome?;
    released
}

async fn ensure(
    session: &mut dyn EngineSession,
    app: &AppCredential,
    privileges: &PrivilegeSet,
) -> Result<()> {
    session.ensure_database(&app.database).await?;
    session.ensure_user(&app.user, app.password.expose()).await?;
    session.grant(privileges, &app.database, &app.user).await?;
    session.post_grant_sync().await
}
