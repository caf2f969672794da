//! Sitegate server binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use sitegate_core::config::AppConfig;
use sitegate_server::bootstrap::build_registry;
use sitegate_server::{AppState, create_router};
use sitegate_tenancy::{RequestInfo, migrate_attachments};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sitegate - multi-tenant domain resolution server
#[derive(Parser, Debug)]
#[command(name = "sitegated")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SITEGATE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve HTTP requests (default)
    Serve,
    /// Attach every untagged entity row to the master domain, then exit
    MigrateAttachments,
}

fn load_config(path: &str) -> Result<AppConfig> {
    let config_path = std::path::Path::new(path);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}, using defaults and environment", path);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SITEGATE_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Sitegate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    let metadata = sitegate_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    let registry = build_registry(metadata.as_ref(), &config).await?;
    let state = AppState::new(config.clone(), metadata, registry);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::MigrateAttachments => run_migration(&state).await,
    }
}

async fn serve(state: AppState, config: &AppConfig) -> Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn run_migration(state: &AppState) -> Result<()> {
    let mut domains = state.domains_management(RequestInfo::detached(&state.config.http));
    domains
        .initialize(false)
        .await
        .context("failed to load domains")?;

    let report = migrate_attachments(&domains, state.metadata.as_ref(), &state.registry)
        .await
        .context("attachment migration failed")?;

    tracing::info!(
        domain_id = %report.domain_id,
        tables = report.tables.len(),
        attached = report.total(),
        "Attachment migration finished"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
