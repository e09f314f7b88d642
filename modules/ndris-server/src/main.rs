use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ndris_common::{AppConfig, FileConfig};
use ndris_domains::NeglectIndexEngine;
use ndris_server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "ndris-server", about = "District neglect index server")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, default_value = "./config/ndris.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting ndris-server");

    let cli = Cli::parse();

    let config_path = cli.config.canonicalize().with_context(|| {
        format!(
            "Config file not found: {}. Create one or specify --config <path>",
            cli.config.display()
        )
    })?;
    tracing::info!(config = %config_path.display(), "Loading config");
    let file_config = FileConfig::load(&config_path)?;

    // Secrets from env vars
    let config = AppConfig::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(max_connections = config.max_connections, "Connected to database");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    let state = Arc::new(AppState {
        engine: NeglectIndexEngine::postgres(pool.clone()),
        pool,
        refresh_on_write: file_config.index.refresh_on_write,
    });

    let app = build_router(state, &file_config.server.allowed_origins);

    let addr = format!("{}:{}", file_config.server.host, file_config.server.port);
    tracing::info!(
        %addr,
        refresh_on_write = file_config.index.refresh_on_write,
        "ndris-server listening"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
