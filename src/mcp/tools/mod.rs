//! MCP Tools
//!
//! Tool implementations for task records.

pub mod tasks;

use super::catalog::ToolCatalog;

/// Register all tools with the catalog
pub fn register_all_tools(catalog: &mut ToolCatalog) {
    tasks::register_tools(catalog);
}
