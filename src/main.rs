use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod mcp;
use mcp::widgets::{WidgetConfig, WidgetRegistry};

mod record_store;
use record_store::{RecordStore, SqliteRecordStore, KIND_TASK};

mod server;
use server::{run_server, OriginPolicy, ServerState};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite record database file.
    #[clap(value_parser = parse_path)]
    pub db_path: PathBuf,

    /// Path to the widget assets directory (built HTML templates).
    #[clap(value_parser = parse_path)]
    pub assets_dir: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Externally reachable base URL, injected into widget markup and
    /// added to the origin allow-list.
    #[clap(long)]
    pub public_base_url: Option<String>,

    /// Comma-separated extra allowed origins.
    #[clap(long)]
    pub allowed_origins: Option<String>,

    /// Path to an optional TOML config file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

fn server_version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        db_path: Some(cli_args.db_path),
        assets_dir: Some(cli_args.assets_dir),
        port: cli_args.port,
        public_base_url: cli_args.public_base_url,
        allowed_origins: cli_args.allowed_origins,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Starting taskdeck-mcp {} on port {}",
        server_version(),
        config.port
    );

    let store = Arc::new(SqliteRecordStore::open(&config.db_path)?);

    let widgets = WidgetConfig {
        assets_dir: config.assets_dir.clone(),
        base_url: config.public_base_url.clone(),
    };

    // Serving a widget response with absent markup would silently corrupt
    // the client experience; fail loudly before accepting traffic.
    WidgetRegistry::global(&widgets).context("widget warm-up failed")?;

    // Store warm-up is advisory: discovery calls work without it.
    match store.list_all(KIND_TASK).await {
        Ok(records) => info!("Record store warm-up ok, {} tasks", records.len()),
        Err(e) => warn!("Record store warm-up failed: {:#}", e),
    }

    let origin_policy = Arc::new(OriginPolicy::build(
        Some(&config.public_base_url),
        config.allowed_origins.as_deref(),
    ));

    let state = ServerState {
        store,
        origin_policy,
        widgets,
        version: server_version(),
    };

    run_server(state, config.port).await
}
