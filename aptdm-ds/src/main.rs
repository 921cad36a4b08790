//! aptdm-ds (Dataset Service) - APT data management over HTTP
//!
//! Serves the dataset → sample → reconstruction → analysis hierarchy kept
//! under `<root folder>/datasets`.

use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use aptdm_common::config::{
    default_config_path, load_toml_config, CompiledDefaults, RootFolderInitializer,
    RootFolderResolver, TomlConfig,
};
use aptdm_common::DataStore;
use aptdm_ds::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for aptdm-ds
#[derive(Parser, Debug)]
#[command(name = "aptdm-ds")]
#[command(about = "Dataset service for atom-probe tomography data")]
#[command(version)]
struct Args {
    /// Root folder holding the datasets directory
    #[arg(short, long, env = "APTDM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "APTDM_DS_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "APTDM_DS_BIND")]
    bind: Option<String>,

    /// TOML config file (default: <config dir>/aptdm/aptdm-ds.toml)
    #[arg(short, long, env = "APTDM_DS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = read_config(args.config.clone());

    // RUST_LOG wins over the config file
    let default_filter = format!(
        "aptdm_ds={0},aptdm_common={0},tower_http=info",
        config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(fmt::layer())
        .with(log_file_layer(config.logging.log_file.as_deref()))
        .init();

    info!(
        "Starting APT Dataset Service (aptdm-ds) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("dataset-service")
        .with_cli_arg(args.root_folder)
        .with_config_path(args.config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create datasets directory")?;
    let datasets = initializer.datasets_path();
    info!("Datasets directory: {}", datasets.display());

    let store = DataStore::new(datasets);
    if let Err(e) = store.clear_staging() {
        warn!("Failed to clear staged uploads: {}", e);
    }
    let state = AppState::new(store);
    let app = build_router(state);

    let defaults = CompiledDefaults::for_current_platform();
    let bind = args
        .bind
        .or(config.bind_address)
        .unwrap_or(defaults.bind_address);
    let port = args.port.or(config.port).unwrap_or(defaults.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("aptdm-ds listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Load the TOML config, falling back to defaults when absent or unreadable
fn read_config(explicit: Option<PathBuf>) -> TomlConfig {
    let Some(path) = explicit.or_else(default_config_path) else {
        return TomlConfig::default();
    };
    match load_toml_config(&path) {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet
            eprintln!("Warning: {}; using defaults", e);
            TomlConfig::default()
        }
    }
}

type FileLayer<S> = fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, Mutex<File>>;

/// Extra plain-text log output appended to `logging.log_file`, if set
fn log_file_layer<S>(path: Option<&Path>) -> Option<FileLayer<S>> {
    let path = path?;
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
