//! MCP Tool and Resource Catalog
//!
//! Immutable descriptor tables built fresh for each dispatcher. Tools
//! carry their argument schema, behavior annotations, handler and optional
//! widget binding; resources are generated 1:1 from the widget table.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::context::ToolContext;
use super::protocol::{
    McpError, ResourceDefinition, ResourceTemplateDefinition, ToolAnnotations, ToolDefinition,
    WIDGET_MIME_TYPE,
};
use super::schema::ArgumentSchema;
use super::widgets::{WidgetSpec, WIDGET_SPECS};

// ============================================================================
// Tool Types
// ============================================================================

/// What a handler produces: a human summary, an optional machine payload
/// and whether this is a reported domain failure.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub summary: String,
    pub payload: Option<Value>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            payload: None,
            is_error: false,
        }
    }

    pub fn with_payload(summary: impl Into<String>, payload: Value) -> Self {
        Self {
            summary: summary.into(),
            payload: Some(payload),
            is_error: false,
        }
    }

    /// Domain-tier failure (e.g. record not found). Expected outcome,
    /// never a transport error.
    pub fn fail(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            payload: None,
            is_error: true,
        }
    }
}

/// Result type for tool execution
pub type ToolResult = Result<ToolOutput, McpError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct ToolDescriptor {
    pub name: String,
    pub title: String,
    pub description: String,
    pub schema: ArgumentSchema,
    pub annotations: ToolAnnotations,
    pub widget: Option<&'static WidgetSpec>,
    pub handler: ToolHandler,
}

/// A readable artifact exposed by uri; here always a widget template.
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: String,
    pub widget: &'static WidgetSpec,
}

// ============================================================================
// Catalog
// ============================================================================

pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    resources: Vec<ResourceDescriptor>,
}

impl ToolCatalog {
    /// The full catalog served by this system.
    pub fn build() -> Self {
        let mut catalog = Self::empty();
        super::tools::register_all_tools(&mut catalog);
        catalog.register_widget_resources();
        catalog
    }

    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn register_tool(&mut self, tool: ToolDescriptor) {
        debug_assert!(
            !self.tools.iter().any(|t| t.name == tool.name),
            "duplicate tool name: {}",
            tool.name
        );
        self.tools.push(tool);
    }

    /// One resource per widget descriptor (1:1).
    fn register_widget_resources(&mut self) {
        for spec in WIDGET_SPECS {
            self.resources.push(ResourceDescriptor {
                uri: spec.template_uri.to_string(),
                name: spec.title.to_string(),
                description: Some(format!("{} widget markup", spec.title)),
                mime_type: WIDGET_MIME_TYPE.to_string(),
                widget: spec,
            });
        }
    }

    pub fn tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn resource(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|resource| resource.uri == uri)
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                title: tool.title.clone(),
                description: tool.description.clone(),
                input_schema: tool.schema.to_json_schema(),
                annotations: tool.annotations,
                meta: tool.widget.map(WidgetSpec::meta),
            })
            .collect()
    }

    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        self.resources
            .iter()
            .map(|resource| ResourceDefinition {
                uri: resource.uri.clone(),
                name: resource.name.clone(),
                description: resource.description.clone(),
                mime_type: Some(resource.mime_type.clone()),
            })
            .collect()
    }

    pub fn resource_template_definitions(&self) -> Vec<ResourceTemplateDefinition> {
        self.resources
            .iter()
            .map(|resource| ResourceTemplateDefinition {
                uri_template: resource.uri.clone(),
                name: resource.name.clone(),
                mime_type: Some(resource.mime_type.clone()),
            })
            .collect()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    title: String,
    description: String,
    schema: ArgumentSchema,
    annotations: ToolAnnotations,
    widget: Option<&'static WidgetSpec>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            description: String::new(),
            schema: ArgumentSchema::new(),
            annotations: ToolAnnotations::default(),
            widget: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn schema(mut self, schema: ArgumentSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.annotations.read_only_hint = true;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.annotations.destructive_hint = true;
        self
    }

    pub fn open_world(mut self) -> Self {
        self.annotations.open_world_hint = true;
        self
    }

    pub fn widget(mut self, spec: &'static WidgetSpec) -> Self {
        self.widget = Some(spec);
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> ToolDescriptor
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        ToolDescriptor {
            name: self.name,
            title: self.title,
            description: self.description,
            schema: self.schema,
            annotations: self.annotations,
            widget: self.widget,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}
