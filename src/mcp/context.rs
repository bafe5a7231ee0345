//! MCP Tool Execution Context
//!
//! Provides access to collaborators for tool implementations.

use std::sync::Arc;

use crate::mcp::widgets::WidgetConfig;
use crate::record_store::RecordStore;

/// Context provided to tool and resource handlers during execution.
///
/// Cloned into each fresh dispatcher; carries no per-request mutable
/// state, so concurrent requests cannot observe each other through it.
#[derive(Clone)]
pub struct ToolContext {
    /// Access to record data
    pub store: Arc<dyn RecordStore>,

    /// Where widget markup lives and which base URL gets baked into it
    pub widgets: WidgetConfig,

    /// Server version info
    pub server_version: String,
}
