//! Taskdeck MCP Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod mcp;
pub mod record_store;
pub mod server;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use mcp::{Dispatcher, McpError, McpRequest, McpResponse, ToolContext};
pub use record_store::{Record, RecordStore, SqliteRecordStore};
pub use server::{make_app, run_server, OriginPolicy, ServerState};
