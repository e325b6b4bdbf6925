//! wishlist-ai - Travel wishlist service
//!
//! Serves the wishlist over a local HTTP API. Places are resolved through
//! the Gemini API and persisted as JSON in the data folder.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wishlist_common::config::{
    default_config_path, ensure_directory_exists, load_toml_config, resolve_api_key,
    DataFolderResolver, LoggingConfig,
};
use wishlist_common::events::EventBus;

use wishlist_ai::services::GeminiClient;
use wishlist_ai::store::{FileKeyValueStore, PlaceStore};
use wishlist_ai::workflow::EnrichmentWorkflow;
use wishlist_ai::AppState;

/// Command-line arguments for wishlist-ai
#[derive(Parser, Debug)]
#[command(name = "wishlist-ai")]
#[command(about = "Travel wishlist service with AI place enrichment")]
#[command(version)]
struct Args {
    /// Bootstrap config file
    #[arg(short, long, env = "WISHLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the persisted wishlist
    #[arg(short, long)]
    data_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "WISHLIST_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = load_toml_config(&config_path).context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    info!("Starting wishlist-ai (Travel Wishlist)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let data_folder = DataFolderResolver::new(args.data_folder, config.data_folder.clone()).resolve();
    ensure_directory_exists(&data_folder).context("Failed to initialize data folder")?;
    info!("Data folder: {}", data_folder.display());

    let event_bus = EventBus::new(100);

    let (store, load_errors) = PlaceStore::open(Arc::new(FileKeyValueStore::new(&data_folder)));
    for error in &load_errors {
        warn!(error = %error, "Saved data could not be restored");
    }
    let store = store.with_event_bus(event_bus.clone()).into_shared();

    let api_key = resolve_api_key(&config);
    let resolver =
        GeminiClient::new(&config.gemini, api_key).context("Failed to create Gemini client")?;
    info!(
        model = %config.gemini.model,
        credentials = resolver.has_credentials(),
        "AI resolver ready"
    );

    let workflow = EnrichmentWorkflow::new(store, Arc::new(resolver))
        .with_detail_timeout(config.enrichment.detail_timeout());

    let state =
        AppState::new(workflow, event_bus).with_upload_limit(config.upload_limit_bytes());
    info!(limit_mb = config.upload_limit_mb, "Request body limit");
    let app = wishlist_ai::build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
        }
        None => registry.with(fmt::layer()).try_init()?,
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
