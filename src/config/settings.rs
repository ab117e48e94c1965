//! # Configuration Settings
//!
//! Defines the configuration structure for the rolesmith service. All
//! settings load from `ROLESMITH_*` environment variables with sensible
//! defaults; `.env` files are honored by the binary before loading.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::{EngineKind, PrivilegeSet, SqlEngineConnector};
use crate::errors::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    pub api: ApiConfig,

    /// Target engine configuration
    pub engine: EngineConfig,

    /// Secret store and credential naming configuration
    pub secrets: SecretsConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Load the full configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            api: ApiConfig::from_env(),
            engine: EngineConfig::from_env()?,
            secrets: SecretsConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api.host.is_empty() {
            return Err(Error::validation("API host cannot be empty"));
        }
        if self.api.port == 0 {
            return Err(Error::validation("API port cannot be 0"));
        }
        self.engine.validate()?;
        self.secrets.validate()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ApiConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create ApiConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("ROLESMITH_API_HOST").unwrap_or(defaults.host),
            port: std::env::var("ROLESMITH_API_PORT")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        }
    }
}

/// Target engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine dialect of the target instance
    pub kind: EngineKind,

    /// Instance hostname
    pub host: String,

    /// Instance port; the dialect default applies when unset
    pub port: Option<u16>,

    /// Dial timeout in seconds
    pub connect_timeout_seconds: u64,

    /// Privilege grant policy: `ALL` or a comma-separated keyword list
    pub privileges: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Postgres,
            host: "localhost".to_string(),
            port: None,
            connect_timeout_seconds: 30,
            privileges: "ALL".to_string(),
        }
    }
}

impl EngineConfig {
    /// Get the dial timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Parse the configured privilege policy
    pub fn privilege_set(&self) -> Result<PrivilegeSet> {
        PrivilegeSet::from_config(&self.privileges)
    }

    /// The effective port, falling back to the dialect default
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.kind.default_port())
    }

    /// Build the production connector for this configuration
    pub fn connector(&self) -> SqlEngineConnector {
        SqlEngineConnector::new(self.kind, self.host.clone(), self.port, self.connect_timeout())
    }

    /// Create EngineConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let kind = match std::env::var("ROLESMITH_ENGINE") {
            Ok(raw) => raw.parse::<EngineKind>()?,
            Err(_) => defaults.kind,
        };

        Ok(Self {
            kind,
            host: std::env::var("ROLESMITH_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("ROLESMITH_DB_PORT").ok().and_then(|s| s.parse::<u16>().ok()),
            connect_timeout_seconds: std::env::var("ROLESMITH_CONNECT_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(defaults.connect_timeout_seconds),
            privileges: std::env::var("ROLESMITH_DB_PRIVILEGES").unwrap_or(defaults.privileges),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::validation("Engine host cannot be empty"));
        }
        if self.connect_timeout_seconds == 0 || self.connect_timeout_seconds > 300 {
            return Err(Error::validation(
                "Engine connect timeout must be between 1 and 300 seconds",
            ));
        }
        self.privilege_set().map(|_| ())
    }
}

/// Secret store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// HashiCorp Vault KV v2 (production)
    Vault,
    /// In-memory store (development and tests)
    Memory,
}

impl std::str::FromStr for SecretBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vault" => Ok(SecretBackend::Vault),
            "memory" => Ok(SecretBackend::Memory),
            other => Err(Error::config(format!("Unknown secret backend: {}", other))),
        }
    }
}

/// Secret store and credential naming configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Which store backend to use
    pub backend: SecretBackend,

    /// Owning service name
    pub service: String,

    /// Secret holding the instance's administrative credential
    pub root_secret_name: String,

    /// Secret holding this service's app credential; defaults to
    /// `{service}DbUser`
    pub app_secret_name: String,

    /// Database login to materialize
    pub username: String,

    /// Database to materialize
    pub database: String,

    /// Principals granted read access to the app secret
    pub readers: Vec<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretBackend::Vault,
            service: "rolesmith".to_string(),
            root_secret_name: "RootDbSecret".to_string(),
            app_secret_name: "rolesmithDbUser".to_string(),
            username: "rolesmith".to_string(),
            database: "rolesmith".to_string(),
            readers: Vec::new(),
        }
    }
}

impl SecretsConfig {
    /// Create SecretsConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let backend = std::env::var("ROLESMITH_SECRET_BACKEND")
            .ok()
            .and_then(|s| s.parse::<SecretBackend>().ok())
            .unwrap_or(defaults.backend);

        let service = std::env::var("ROLESMITH_SERVICE").unwrap_or(defaults.service);
        let app_secret_name = std::env::var("ROLESMITH_APP_SECRET")
            .unwrap_or_else(|_| format!("{}DbUser", service));

        let readers = std::env::var("ROLESMITH_SECRET_READERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.readers);

        Self {
            backend,
            root_secret_name: std::env::var("ROLESMITH_ROOT_SECRET")
                .unwrap_or(defaults.root_secret_name),
            app_secret_name,
            username: std::env::var("ROLESMITH_DB_USER").unwrap_or_else(|_| service.clone()),
            database: std::env::var("ROLESMITH_DB_NAME")
                .unwrap_or_else(|_| format!("{}_db", service)),
            service,
            readers,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.root_secret_name.is_empty() {
            return Err(Error::validation("Root secret name cannot be empty"));
        }
        if self.app_secret_name.is_empty() {
            return Err(Error::validation("App secret name cannot be empty"));
        }
        if self.username.is_empty() || self.database.is_empty() {
            return Err(Error::validation("Database username and name cannot be empty"));
        }
        Ok(())
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter (overridden by `RUST_LOG` when set)
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_format: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_format: false }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("ROLESMITH_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_format: std::env::var("ROLESMITH_LOG_JSON")
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(defaults.json_format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_api_bind_address() {
        let config = ApiConfig { host: "0.0.0.0".to_string(), port: 9090 };
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
    }

    #[test]
    fn test_engine_port_falls_back_to_dialect_default() {
        let mut config = EngineConfig::default();
        assert_eq!(config.port(), 5432);
        config.kind = EngineKind::MariaDb;
        assert_eq!(config.port(), 3306);
        config.port = Some(13306);
        assert_eq!(config.port(), 13306);
    }

    #[test]
    fn test_engine_validate_rejects_bad_timeout() {
        let config = EngineConfig { connect_timeout_seconds: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = EngineConfig { connect_timeout_seconds: 301, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_validate_rejects_bad_privileges() {
        let config = EngineConfig { privileges: "SELECT; DROP".to_string(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_backend_parsing() {
        assert_eq!("vault".parse::<SecretBackend>().unwrap(), SecretBackend::Vault);
        assert_eq!("Memory".parse::<SecretBackend>().unwrap(), SecretBackend::Memory);
        assert!("s3".parse::<SecretBackend>().is_err());
    }

    #[test]
    fn test_secrets_validate_rejects_empty_names() {
        let config = SecretsConfig { root_secret_name: String::new(), ..Default::default() };
        assert!(config.validate().is_err());

        let config = SecretsConfig { database: String::new(), ..Default::default() };
        assert!(config.validate().is_err());
    }
}
