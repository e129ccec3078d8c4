//! Proposal Engine
//!
//! Serves token-gated proposal presentations:
//! - presentations, recipient versions and the template catalogue
//! - view and engagement tracking per client session
//! - per-presentation and per-version analytics

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use proposal_core::Owner;
use proposal_store::{MemoryStore, Store};
use telemetry::init_tracing_from_env;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Public frontend base URL used to build view/edit links.
    #[serde(default = "default_frontend_url")]
    frontend_url: String,

    /// Owner of every presentation created through this instance.
    #[serde(default)]
    owner: OwnerConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct OwnerConfig {
    #[serde(default = "default_owner_email")]
    email: String,
    #[serde(default = "default_owner_name")]
    name: String,
    #[serde(default)]
    company: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_owner_email() -> String {
    "owner@localhost".to_string()
}

fn default_owner_name() -> String {
    "Proposal Owner".to_string()
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            email: default_owner_email(),
            name: default_owner_name(),
            company: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: default_frontend_url(),
            owner: OwnerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Proposal Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        frontend_url = %config.frontend_url,
        owner = %config.owner.email,
        "Loaded configuration"
    );

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let owner = store
        .upsert_owner(Owner::new(
            config.owner.email.clone(),
            config.owner.name.clone(),
            config.owner.company.clone(),
        ))
        .await
        .context("Failed to bootstrap owner")?;
    info!(owner_id = %owner.id, email = %owner.email, "Owner ready");

    let state = AppState::new(store.clone(), owner, &config.frontend_url)
        .context("Failed to build application state")?;

    match store.ping().await {
        Ok(()) => {
            state.health.store.set_healthy();
            info!(backend = store.backend_name(), "Store: healthy");
        }
        Err(e) => {
            state.health.store.set_unhealthy(e.to_string());
            error!(backend = store.backend_name(), error = %e, "Store: unhealthy");
        }
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // e.g. PROPOSALS__PORT, PROPOSALS__OWNER__EMAIL
        .add_source(
            config::Environment::with_prefix("PROPOSALS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
