//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own record store; widget
//! markup is cached process-wide, so every spawn writes identical assets.

use std::sync::Arc;
use std::time::Duration;

use taskdeck_mcp_server::mcp::widgets::WidgetConfig;
use taskdeck_mcp_server::record_store::{RecordStore, SqliteRecordStore};
use taskdeck_mcp_server::server::{make_app, OriginPolicy, ServerState};
use tempfile::TempDir;
use tokio::net::TcpListener;

use super::constants::*;
use super::fixtures::{create_widget_assets, seed_test_tasks};

/// Test server instance with an isolated record store
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Record store for direct database access in tests
    pub store: Arc<dyn RecordStore>,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server with the default origin policy.
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(OriginPolicy::build(None, None)).await
    }

    /// Spawns a test server whose origin policy also allows `extra`
    /// (comma-separated entries, as the CLI flag accepts them).
    pub async fn spawn_with_extra_origins(extra: &str) -> Self {
        Self::spawn_with_policy(OriginPolicy::build(None, Some(extra))).await
    }

    async fn spawn_with_policy(origin_policy: OriginPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        // Record store seeded with the standard test board
        let db_path = temp_dir.path().join("taskdeck.db");
        let store: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::open(&db_path).expect("Failed to open record store"));
        seed_test_tasks(store.as_ref())
            .await
            .expect("Failed to seed test tasks");

        // Widget assets; identical markup per spawn, see WIDGET_MARKUP
        let assets_dir = temp_dir.path().join("assets");
        create_widget_assets(&assets_dir).expect("Failed to create widget assets");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = ServerState {
            store: store.clone(),
            origin_policy: Arc::new(origin_policy),
            widgets: WidgetConfig {
                assets_dir,
                base_url: base_url.clone(),
            },
            version: "e2e-test".to_string(),
        };

        let app = make_app(state);

        // Create shutdown channel and spawn the server in a background task
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling /health
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/health", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
