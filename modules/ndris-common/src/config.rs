use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Secrets and environment-specific values, loaded from env vars (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        tracing::info!(max_connections = config.max_connections, "Config loaded");
        Ok(config)
    }
}

/// TOML-backed configuration loaded from disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Refresh a district's index row after every record write touching it.
    #[serde(default = "default_refresh_on_write")]
    pub refresh_on_write: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            refresh_on_write: default_refresh_on_write(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_refresh_on_write() -> bool {
    true
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}
