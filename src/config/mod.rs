mod file_config;

pub use file_config::FileConfig;

use std::path::PathBuf;

use anyhow::{bail, Result};

/// CLI arguments that can be overridden by file and environment config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub port: u16,
    pub public_base_url: Option<String>,
    pub allowed_origins: Option<String>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    pub port: u16,
    /// Externally reachable base URL, baked into widget markup and added
    /// to the origin allow-list.
    pub public_base_url: String,
    /// Comma-separated extra allowed-origin entries.
    pub allowed_origins: Option<String>,
}

/// Environment variables recognized on top of CLI and file config.
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";
    pub const ALLOWED_ORIGINS: &str = "MCP_ALLOWED_ORIGINS";
}

impl AppConfig {
    /// Resolve configuration. Precedence, lowest to highest: CLI, TOML
    /// file, environment.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("record db path must be specified via CLI or config file")
            })?;

        let assets_dir = file
            .assets_dir
            .or_else(|| cli.assets_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("widget assets dir must be specified via CLI or config file")
            })?;
        if !assets_dir.is_dir() {
            bail!("widget assets dir does not exist: {:?}", assets_dir);
        }

        let mut port = file.port.unwrap_or(cli.port);
        if let Ok(raw) = std::env::var(env_vars::PORT) {
            port = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid {} value: {}", env_vars::PORT, raw))?;
        }

        let public_base_url = std::env::var(env_vars::PUBLIC_BASE_URL)
            .ok()
            .or(file.public_base_url)
            .or_else(|| cli.public_base_url.clone())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let allowed_origins = std::env::var(env_vars::ALLOWED_ORIGINS)
            .ok()
            .or(file.allowed_origins)
            .or_else(|| cli.allowed_origins.clone());

        Ok(Self {
            db_path,
            assets_dir,
            port,
            public_base_url,
            allowed_origins,
        })
    }
}
