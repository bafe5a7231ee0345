//! Protocol Dispatcher
//!
//! Resolves one decoded request envelope against the catalog. Built fresh
//! for every inbound request: nothing here survives across requests, so
//! there is no session affinity and no cross-request leakage.

use serde_json::Value;
use tracing::{error, warn};

use super::catalog::ToolCatalog;
use super::context::ToolContext;
use super::protocol::{
    methods, InitializeResult, McpError, McpRequest, McpResponse, PingResult, ResourceContent,
    ResourcesCapability, ResourcesListResult, ResourcesReadParams, ResourcesReadResult,
    ResourceTemplatesListResult, ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCallResult,
    ToolsCapability, ToolsListResult, MCP_PROTOCOL_VERSION,
};
use super::widgets::WidgetRegistry;
use crate::server::metrics;

pub struct Dispatcher {
    catalog: ToolCatalog,
    ctx: ToolContext,
}

impl Dispatcher {
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            catalog: ToolCatalog::build(),
            ctx,
        }
    }

    /// Handle one request envelope. Always produces a response; transport
    /// concerns (notifications, malformed JSON) are settled before this
    /// point by the front door.
    pub async fn dispatch(&self, request: McpRequest) -> McpResponse {
        let request_id = request.id.clone();

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => to_value(PingResult {}),
            methods::TOOLS_LIST => self.handle_tools_list(),
            methods::TOOLS_CALL => self.handle_tools_call(&request).await,
            methods::RESOURCES_LIST => self.handle_resources_list(),
            methods::RESOURCE_TEMPLATES_LIST => self.handle_resource_templates_list(),
            methods::RESOURCES_READ => self.handle_resources_read(&request),
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        match result {
            Ok(value) => McpResponse::success(request_id, value),
            Err(error) => McpResponse::error(Some(request_id), error),
        }
    }

    fn handle_initialize(&self) -> Result<Value, McpError> {
        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: None,
                }),
            },
            server_info: ServerInfo {
                name: "taskdeck-mcp".to_string(),
                version: self.ctx.server_version.clone(),
            },
        };
        to_value(result)
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        to_value(ToolsListResult {
            tools: self.catalog.tool_definitions(),
        })
    }

    async fn handle_tools_call(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ToolsCallParams = parse_params(request)?;

        let Some(tool) = self.catalog.tool(&params.name) else {
            // Unknown tool is a reported condition, not a crash.
            warn!("Call to unknown tool: {}", params.name);
            metrics::TOOL_CALLS_TOTAL
                .with_label_values(&[&params.name, "unknown"])
                .inc();
            return to_value(ToolsCallResult::domain_error(format!(
                "Unknown tool: {}",
                params.name
            )));
        };

        let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));
        tool.schema
            .validate(&arguments)
            .map_err(McpError::Validation)?;

        // A widget-bound call must be renderable: resolve the registry
        // before running the handler so a missing artifact surfaces as a
        // configuration failure, not a half-built response.
        let meta = match tool.widget {
            Some(spec) => {
                WidgetRegistry::global(&self.ctx.widgets).map_err(|e| {
                    error!("Widget registry unavailable: {:#}", e);
                    McpError::InternalError(format!("widget assets unavailable: {}", e))
                })?;
                Some(spec.meta())
            }
            None => None,
        };

        let output = (tool.handler)(self.ctx.clone(), arguments).await?;
        metrics::TOOL_CALLS_TOTAL
            .with_label_values(&[&params.name, if output.is_error { "error" } else { "ok" }])
            .inc();

        let mut result = if output.is_error {
            ToolsCallResult::domain_error(output.summary)
        } else {
            ToolsCallResult::text(output.summary)
        };
        if let Some(payload) = output.payload {
            result = result.with_structured(payload);
        }
        // Handlers never set widget metadata; it comes from the binding.
        if let Some(meta) = meta {
            result = result.with_meta(meta);
        }
        to_value(result)
    }

    fn handle_resources_list(&self) -> Result<Value, McpError> {
        to_value(ResourcesListResult {
            resources: self.catalog.resource_definitions(),
        })
    }

    fn handle_resource_templates_list(&self) -> Result<Value, McpError> {
        to_value(ResourceTemplatesListResult {
            resource_templates: self.catalog.resource_template_definitions(),
        })
    }

    fn handle_resources_read(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ResourcesReadParams = parse_params(request)?;

        let Some(resource) = self.catalog.resource(&params.uri) else {
            // Protocol-level "not found": empty contents plus error marker.
            return to_value(ResourcesReadResult::unknown_uri(&params.uri));
        };

        let registry = WidgetRegistry::global(&self.ctx.widgets).map_err(|e| {
            error!("Widget registry unavailable: {:#}", e);
            McpError::InternalError(format!("widget assets unavailable: {}", e))
        })?;
        let descriptor = registry.resolve(resource.widget.id).ok_or_else(|| {
            McpError::InternalError(format!("widget not loaded: {}", resource.widget.id))
        })?;

        to_value(ResourcesReadResult {
            contents: vec![ResourceContent::Text {
                uri: resource.uri.clone(),
                mime_type: Some(resource.mime_type.clone()),
                text: descriptor.markup.clone(),
            }],
            meta: None,
        })
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(request: &McpRequest) -> Result<T, McpError> {
    request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;
    use crate::mcp::widgets::WidgetConfig;
    use crate::record_store::{RecordStore, SqliteRecordStore, KIND_TASK};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn request(method: &str, params: Option<Value>) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    async fn seeded_dispatcher() -> Dispatcher {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let mut attrs = BTreeMap::new();
        attrs.insert("title".to_string(), "Fix the roof".to_string());
        attrs.insert("status".to_string(), "todo".to_string());
        attrs.insert("assignee".to_string(), "ada".to_string());
        attrs.insert("estimated_hours".to_string(), "3".to_string());
        attrs.insert("tags".to_string(), "[\"maintenance\"]".to_string());
        store.create(KIND_TASK, "t-1", &attrs).await.unwrap();

        Dispatcher::new(ToolContext {
            store: Arc::new(store),
            widgets: WidgetConfig {
                assets_dir: PathBuf::from("/nonexistent"),
                base_url: "http://localhost:3000".to_string(),
            },
            server_version: "test".to_string(),
        })
    }

    #[tokio::test]
    async fn test_initialize_reports_protocol_version() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher.dispatch(request(methods::INITIALIZE, None)).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "taskdeck-mcp");
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher.dispatch(request("bogus/method", None)).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_list_contains_task_tools() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher.dispatch(request(methods::TOOLS_LIST, None)).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        for expected in [
            "list-tasks",
            "get-task",
            "create-task",
            "update-task",
            "delete-task",
            "summarize-workload",
        ] {
            assert!(names.contains(&expected), "missing tool {}", expected);
        }
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_in_band_error() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher
            .dispatch(request(
                methods::TOOLS_CALL,
                Some(json!({"name": "no-such-tool", "arguments": {}})),
            ))
            .await;
        assert!(response.error.is_none(), "must not be a transport error");
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Unknown tool: no-such-tool"
        );
    }

    #[tokio::test]
    async fn test_call_with_invalid_arguments_is_validation_error() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher
            .dispatch(request(
                methods::TOOLS_CALL,
                Some(json!({"name": "get-task", "arguments": {}})),
            ))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.data.unwrap()["errors"][0]
            .as_str()
            .unwrap()
            .contains("id"));
    }

    #[tokio::test]
    async fn test_domain_error_never_throws() {
        let dispatcher = seeded_dispatcher().await;
        // delete-task has no widget binding, so the missing assets dir
        // cannot interfere.
        let response = dispatcher
            .dispatch(request(
                methods::TOOLS_CALL,
                Some(json!({"name": "delete-task", "arguments": {"id": "ghost"}})),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result.get("_meta").is_none());
    }

    #[tokio::test]
    async fn test_delete_existing_task_has_no_widget_meta() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher
            .dispatch(request(
                methods::TOOLS_CALL,
                Some(json!({"name": "delete-task", "arguments": {"id": "t-1"}})),
            ))
            .await;
        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
        assert!(result.get("_meta").is_none());
        assert!(result.get("structuredContent").is_none());
    }

    #[tokio::test]
    async fn test_resources_read_unknown_uri_is_empty_with_marker() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher
            .dispatch(request(
                methods::RESOURCES_READ,
                Some(json!({"uri": "ui://widget/nope.html"})),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["contents"].as_array().unwrap().len(), 0);
        assert!(result["_meta"]["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_resources_list_is_widget_table() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher
            .dispatch(request(methods::RESOURCES_LIST, None))
            .await;
        let resources = response.result.unwrap()["resources"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(resources.len(), 3);
        assert!(resources
            .iter()
            .any(|r| r["uri"] == "ui://widget/task-board.html"));
    }

    #[tokio::test]
    async fn test_dispatchers_share_no_state() {
        let a = seeded_dispatcher().await;
        let b = seeded_dispatcher().await;
        assert!(!std::ptr::eq(&a.catalog, &b.catalog));

        // Mutating through one dispatcher's store is invisible to the
        // other: each was built with its own collaborator.
        a.dispatch(request(
            methods::TOOLS_CALL,
            Some(json!({"name": "delete-task", "arguments": {"id": "t-1"}})),
        ))
        .await;
        let response = b
            .dispatch(request(
                methods::TOOLS_CALL,
                Some(json!({"name": "delete-task", "arguments": {"id": "t-1"}})),
            ))
            .await;
        assert!(response.result.unwrap().get("isError").is_none());
    }

    #[tokio::test]
    async fn test_missing_params_rejected() {
        let dispatcher = seeded_dispatcher().await;
        let response = dispatcher.dispatch(request(methods::TOOLS_CALL, None)).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }
}
