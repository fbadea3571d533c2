//! reaperd — the reaper daemon.
//!
//! Single binary that assembles the cleanup engine:
//! - Resource registry (redb)
//! - Deletion catalog (webhook providers from reaper.toml)
//! - Dispatcher + HTTP intake (axum)
//!
//! # Usage
//!
//! ```text
//! reaperd serve --port 8440 --config /etc/reaper/reaper.toml
//! reaperd sweep --instance i-0abc123
//! reaperd handle --file envelope.json
//! ```

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use reaper_api::Dispatcher;
use reaper_state::RegistryStore;
use reaper_sweep::Sweeper;

use config::{ReaperConfig, RegistrySettings};

#[derive(Parser)]
#[command(name = "reaperd", about = "Reaper daemon")]
struct Cli {
    /// Path to reaper.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry data directory (overrides environment and config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Registry table name (overrides environment and config file).
    #[arg(long, global = true)]
    table: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP notification intake.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8440")]
        port: u16,
    },
    /// Sweep one instance's tracked resources and exit.
    Sweep {
        /// Instance id whose resources to sweep.
        #[arg(long)]
        instance: String,
    },
    /// Dispatch a single notification envelope from disk and exit.
    Handle {
        /// Path to a JSON envelope file.
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reaperd=debug,reaper_api=debug,reaper_sweep=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReaperConfig::from_file(path)?,
        None => ReaperConfig::default(),
    };
    let settings = config.registry_settings(
        cli.data_dir.clone(),
        cli.table.clone(),
        std::env::var(config::ENV_DATA_DIR).ok(),
        std::env::var(config::ENV_TABLE).ok(),
    );

    match cli.command {
        Command::Serve { port } => run_serve(config, settings, port).await,
        Command::Sweep { instance } => run_sweep(config, settings, &instance).await,
        Command::Handle { file } => run_handle(config, settings, &file).await,
    }
}

fn open_registry(settings: &RegistrySettings) -> anyhow::Result<RegistryStore> {
    std::fs::create_dir_all(&settings.data_dir)?;
    let db_path = settings.data_dir.join("reaper.redb");

    let store = RegistryStore::open(&db_path, &settings.table)?;
    info!(path = ?db_path, table = %settings.table, "registry opened");
    Ok(store)
}

async fn run_serve(
    config: ReaperConfig,
    settings: RegistrySettings,
    port: u16,
) -> anyhow::Result<()> {
    info!("reaper daemon starting");

    let store = open_registry(&settings)?;

    let catalog = config::build_catalog(&config.providers)?;
    for op in catalog.operations() {
        info!(operation = %op, "delete operation registered");
    }
    if catalog.is_empty() {
        warn!("no providers configured; sweeps will prune records without deleting");
    }

    let sweeper = Sweeper::new(store.clone(), catalog);
    let router = reaper_api::build_router(store, sweeper);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "intake server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("reaper daemon stopped");
    Ok(())
}

async fn run_sweep(
    config: ReaperConfig,
    settings: RegistrySettings,
    instance: &str,
) -> anyhow::Result<()> {
    let store = open_registry(&settings)?;
    let catalog = config::build_catalog(&config.providers)?;
    let sweeper = Sweeper::new(store, catalog);

    let report = sweeper.sweep_instance(instance).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_handle(
    config: ReaperConfig,
    settings: RegistrySettings,
    file: &Path,
) -> anyhow::Result<()> {
    let envelope: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;

    let store = open_registry(&settings)?;
    let catalog = config::build_catalog(&config.providers)?;
    let sweeper = Sweeper::new(store.clone(), catalog);
    let dispatcher = Dispatcher::new(store, sweeper);

    let disposition = dispatcher.handle(&envelope).await?;
    println!("{}", serde_json::to_string_pretty(&disposition)?);
    Ok(())
}
