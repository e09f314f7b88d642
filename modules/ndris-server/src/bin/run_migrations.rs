//! Runs pending SQLx migrations against the database.
//!
//! Migrations are embedded at compile time, so no migration files
//! are needed at runtime.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;

use ndris_common::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    println!("Running database migrations...");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    println!("Migrations completed successfully.");

    Ok(())
}
