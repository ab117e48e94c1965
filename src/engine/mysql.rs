//! MariaDB/MySQL engine session.
//!
//! DDL idioms for this dialect: native `IF NOT EXISTS` clauses make
//! existence handling race-tolerant without check-then-act queries, the
//! password is re-asserted unconditionally with `ALTER USER` so secret
//! rotation always lands, and the privilege cache is flushed after grants.
//! Users are created at host `'%'`: access control is the network's job,
//! authentication is this user's password.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;

use crate::credentials::RootCredential;
use crate::errors::{Error, Result};

use super::sql::{mysql_ident, mysql_literal};
use super::{EngineSession, PrivilegeSet};

/// One root-credentialed session against a MariaDB instance.
pub struct MariaDbSession {
    conn: MySqlConnection,
}

impl MariaDbSession {
    /// Open a session as the instance's administrative principal.
    pub async fn connect(host: &str, port: u16, root: &RootCredential) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&root.username)
            .password(root.password.expose());

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| Error::connection("mariadb", e.to_string()))?;

        tracing::debug!(host = %host, port = port, "Opened mariadb root session");
        Ok(Self { conn })
    }

    async fn execute(&mut self, operation: &'static str, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(|e| Error::reconciliation(operation, e))
    }
}

fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", mysql_ident(database))
}

fn create_user_sql(username: &str, password: &str) -> String {
    format!(
        "CREATE USER IF NOT EXISTS {}@'%' IDENTIFIED BY {}",
        mysql_literal(username),
        mysql_literal(password)
    )
}

fn alter_user_sql(username: &str, password: &str) -> String {
    format!("ALTER USER {}@'%' IDENTIFIED BY {}", mysql_literal(username), mysql_literal(password))
}

fn grant_sql(privileges: &PrivilegeSet, database: &str, username: &str) -> String {
    format!(
        "GRANT {} ON {}.* TO {}@'%'",
        privileges.render(),
        mysql_ident(database),
        mysql_literal(username)
    )
}

fn drop_user_sql(username: &str) -> String {
    format!("DROP USER IF EXISTS {}@'%'", mysql_literal(username))
}

#[async_trait]
impl EngineSession for MariaDbSession {
    async fn ensure_database(&mut self, database: &str) -> Result<()> {
        self.execute("ensure_database", &create_database_sql(database)).await
    }

    async fn ensure_user(&mut self, username: &str, password: &str) -> Result<()> {
        self.execute("ensure_user", &create_user_sql(username, password)).await?;
        // No-op for a fresh user; reasserts the current password after a
        // secret rotation for an existing one.
        self.execute("ensure_user", &alter_user_sql(username, password)).await
    }

    async fn grant(
        &mut self,
        privileges: &PrivilegeSet,
        database: &str,
        username: &str,
    ) -> Result<()> {
        self.execute("grant", &grant_sql(privileges, database, username)).await
    }

    async fn post_grant_sync(&mut self) -> Result<()> {
        self.execute("post_grant_sync", "FLUSH PRIVILEGES").await
    }

    async fn drop_user(&mut self, username: &str) -> Result<()> {
        // Owned objects live inside the service database, which is
        // decommissioned with the stack; only the account needs dropping.
        self.execute("drop_user", &drop_user_sql(username)).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let MariaDbSession { conn } = *self;
        conn.close().await.map_err(|e| Error::reconciliation("close", e))
    }
}
