//! MCP (Model Context Protocol) Server Core
//!
//! The protocol-handling layer: per-request dispatch of discovery and
//! invocation methods against a tool/resource catalog, with widget
//! metadata bound into responses.
//!
//! ## Architecture
//!
//! - Transport: stateless request/response JSON over HTTP at `/mcp`
//! - Lifecycle: one fresh `Dispatcher` + catalog per inbound request
//! - Tools: task operations against the injected `RecordStore`
//! - Resources: widget HTML templates, one per widget descriptor

pub mod catalog;
pub mod context;
pub mod dispatcher;
pub mod protocol;
pub mod schema;
pub mod tools;
pub mod widgets;

pub use context::ToolContext;
pub use dispatcher::Dispatcher;
pub use protocol::{McpError, McpRequest, McpResponse};
