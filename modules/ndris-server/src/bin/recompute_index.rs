//! Recomputes the neglect index for every district with records and prints
//! the resulting report as JSON. Exits non-zero if any district failed.

use anyhow::{bail, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use ndris_common::AppConfig;
use ndris_domains::NeglectIndexEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    let engine = NeglectIndexEngine::postgres(pool);
    let report = engine.recompute_all().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failed.is_empty() {
        bail!("{} district(s) failed to recompute", report.failed.len());
    }
    Ok(())
}
