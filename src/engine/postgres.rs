//! PostgreSQL engine session.
//!
//! The session connects to the maintenance database as root. PostgreSQL has
//! no `CREATE DATABASE IF NOT EXISTS`, so database creation checks the
//! catalog first and tolerates a concurrent-creation race via the
//! `duplicate_database` error code. User upsert is a guarded `DO` block:
//! `ALTER USER` for an existing role (so rotation always lands), `CREATE
//! USER` otherwise. Deletes drop owned objects best-effort before the user;
//! ownership errors there are logged and suppressed, never surfaced.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;

use crate::credentials::RootCredential;
use crate::errors::{Error, Result};

use super::sql::{pg_ident, pg_literal};
use super::{EngineSession, PrivilegeSet};

/// Maintenance database used for the root session; the target database may
/// not exist yet.
const MAINTENANCE_DATABASE: &str = "postgres";

/// `duplicate_database`: lost a create race with a concurrent invocation.
const DUPLICATE_DATABASE: &str = "42P04";

/// One root-credentialed session against a PostgreSQL instance.
pub struct PostgresSession {
    conn: PgConnection,
}

impl PostgresSession {
    /// Open a session as the instance's administrative principal.
    pub async fn connect(host: &str, port: u16, root: &RootCredential) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(&root.username)
            .password(root.password.expose())
            .database(MAINTENANCE_DATABASE)
            .ssl_mode(PgSslMode::Prefer);

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| Error::connection("postgres", e.to_string()))?;

        tracing::debug!(host = %host, port = port, "Opened postgres root session");
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

fn ensure_user_sql(username: &str, password: &str) -> String {
    let role_literal = pg_literal(username);
    let role_ident = pg_ident(username);
    let password_literal = pg_literal(password);
    format!(
        "DO $do$\n\
         BEGIN\n\
           IF EXISTS (SELECT FROM pg_catalog.pg_roles WHERE rolname = {role_literal}) THEN\n\
             ALTER USER {role_ident} WITH PASSWORD {password_literal};\n\
           ELSE\n\
             CREATE USER {role_ident} WITH PASSWORD {password_literal};\n\
           END IF;\n\
         END\n\
         $do$"
    )
}

fn grant_sql(privileges: &PrivilegeSet, database: &str, username: &str) -> String {
    format!(
        "GRANT {} ON DATABASE {} TO {}",
        privileges.render(),
        pg_ident(database),
        pg_ident(username)
    )
}

fn is_duplicate_database(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == DUPLICATE_DATABASE)
        .unwrap_or(false)
}

#[async_trait]
impl EngineSession for PostgresSession {
    async fn ensure_database(&mut self, database: &str) -> Result<()> {
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
                .bind(database)
                .fetch_optional(&mut self.conn)
                .await
                .map_err(|e| Error::reconciliation("ensure_database", e))?;

        if exists.is_some() {
            return Ok(());
        }

        match sqlx::query(&format!("CREATE DATABASE {}", pg_ident(database)))
            .execute(&mut self.conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_database(&e) => {
                tracing::debug!(database = %database, "Database created concurrently");
                Ok(())
            }
            Err(e) => Err(Error::reconciliation("ensure_database", e)),
        }
    }

    async fn ensure_user(&mut self, username: &str, password: &str) -> Result<()> {
        self.execute("ensure_user", &ensure_user_sql(username, password)).await
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
        // Grants are visible immediately in this dialect.
        Ok(())
    }

    async fn drop_user(&mut self, username: &str) -> Result<()> {
        // Best-effort: the user's database usually dies in the same
        // deployment, so ownership errors in either step are expected noise.
        // `DROP OWNED` also revokes the user's database-level grants, which
        // would otherwise block the role drop.
        if let Err(e) =
            self.execute("drop_owned", &format!("DROP OWNED BY {}", pg_ident(username))).await
        {
            tracing::warn!(
                username = %username,
                error = %e,
                "Suppressed error dropping objects owned by user"
            );
        }

        if let Err(e) = self
            .execute("drop_user", &format!("DROP USER IF EXISTS {}", pg_ident(username)))
            .await
        {
            tracing::warn!(
                username = %username,
                error = %e,
                "Suppressed error dropping user"
            );
        }

        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let PostgresSession { conn } = *self;
        conn.close().await.map_err(|e| Error::reconciliation("close", e))
    }
}
