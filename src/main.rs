use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::info;

use rolesmith::api::{self, AppState};
use rolesmith::cli::{Cli, Commands};
use rolesmith::config::{SecretBackend, Settings};
use rolesmith::credentials::{CredentialLocator, CredentialMaterializer, MaterializeSpec};
use rolesmith::lifecycle::{LifecycleHandler, LifecycleRequest};
use rolesmith::observability::init_tracing;
use rolesmith::secrets::{InMemorySecretStore, SecretStore, VaultSecretStore, VaultStoreConfig};
use rolesmith::{Error, Result, APP_NAME, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing).
    // This must happen before any config is read from the environment.
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_tracing(&settings.observability)?;

    info!(
        app_name = APP_NAME,
        version = VERSION,
        engine = %settings.engine.kind,
        secret_backend = ?settings.secrets.backend,
        "Starting rolesmith"
    );

    match cli.command {
        Commands::Serve => serve(settings).await,
        Commands::Reconcile => reconcile_once(settings).await,
        Commands::Materialize => materialize(settings).await,
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn SecretStore>> {
    match settings.secrets.backend {
        SecretBackend::Vault => {
            let config = VaultStoreConfig::from_env().map_err(|e| Error::config(e.to_string()))?;
            let store = VaultSecretStore::new(config)
                .await
                .map_err(|e| Error::config(format!("Vault store init failed: {}", e)))?;
            Ok(Arc::new(store))
        }
        SecretBackend::Memory => {
            tracing::warn!("Using the in-memory secret store; secrets do not survive restarts");
            Ok(Arc::new(InMemorySecretStore::new()))
        }
    }
}

fn build_handler(settings: &Settings, store: Arc<dyn SecretStore>) -> Result<LifecycleHandler> {
    Ok(LifecycleHandler::new(
        store,
        Arc::new(settings.engine.connector()),
        settings.secrets.root_secret_name.clone(),
        settings.secrets.app_secret_name.clone(),
        settings.engine.privilege_set()?,
    ))
}

async fn serve(settings: Settings) -> Result<()> {
    let store = build_store(&settings).await?;
    let handler = Arc::new(build_handler(&settings, store)?);
    api::serve(AppState::new(handler), &settings.api.bind_address()).await
}

/// One-shot mode: one lifecycle event in on stdin, one status out on
/// stdout. The process exits 0 whenever a status was produced; FAILED is a
/// protocol outcome, not a process error.
async fn reconcile_once(settings: Settings) -> Result<()> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let request: LifecycleRequest = serde_json::from_str(&input)
        .map_err(|e| Error::serialization("lifecycle event on stdin", e))?;

    let store = build_store(&settings).await?;
    let handler = build_handler(&settings, store)?;
    let response = handler.handle(request).await;

    let encoded = serde_json::to_string(&response)
        .map_err(|e| Error::serialization("lifecycle response", e))?;
    println!("{}", encoded);
    Ok(())
}

async fn materialize(settings: Settings) -> Result<()> {
    let store = build_store(&settings).await?;
    let materializer = CredentialMaterializer::new(store);

    let spec = MaterializeSpec {
        service: settings.secrets.service.clone(),
        secret_name: settings.secrets.app_secret_name.clone(),
        username: settings.secrets.username.clone(),
        database: settings.secrets.database.clone(),
        host: settings.engine.host.clone(),
        readers: settings.secrets.readers.clone(),
    };
    let credential = materializer.materialize(&spec).await?;
    info!(
        user = %credential.user,
        database = %credential.database,
        secret = %settings.secrets.app_secret_name,
        "App credential materialized"
    );

    let locator =
        CredentialLocator::new(settings.secrets.app_secret_name.clone(), settings.engine.kind);
    let references = serde_json::json!({
        "secretName": settings.secrets.app_secret_name,
        "port": locator.port(),
        "tlsRequired": locator.tls_required(),
        "buildEnvironment": locator.build_environment(),
        "runtimeSecrets": locator.runtime_secrets(),
    });

    let encoded = serde_json::to_string_pretty(&references)
        .map_err(|e| Error::serialization("credential references", e))?;
    println!("{}", encoded);
    Ok(())
}
