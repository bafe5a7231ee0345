//! Task Tools
//!
//! CRUD and reporting operations over task records. Handlers receive
//! schema-validated arguments and the injected record store; they return
//! summary text plus an optional structured payload and never touch
//! widget metadata (the dispatcher binds that).

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::mcp::catalog::{ToolBuilder, ToolCatalog, ToolOutput, ToolResult};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::McpError;
use crate::mcp::schema::{ArgumentSchema, FieldKind, FieldSpec};
use crate::mcp::widgets::widget_spec;
use crate::record_store::{Record, KIND_TASK};

const DEFAULT_STATUS: &str = "todo";

/// Register task tools with the catalog
pub fn register_tools(catalog: &mut ToolCatalog) {
    catalog.register_tool(list_tasks_tool());
    catalog.register_tool(get_task_tool());
    catalog.register_tool(create_task_tool());
    catalog.register_tool(update_task_tool());
    catalog.register_tool(delete_task_tool());
    catalog.register_tool(summarize_workload_tool());
}

// ============================================================================
// Task view
// ============================================================================

/// Task record as handlers expose it. Multi-valued fields arrive from the
/// store pre-serialized (tags are a JSON array string) and are parsed here.
#[derive(Debug, Serialize)]
struct TaskView {
    id: String,
    title: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    estimated_hours: f64,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl TaskView {
    fn from_record(record: &Record) -> Self {
        let tags = record
            .attr("tags")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        Self {
            id: record.id.clone(),
            title: record.attr("title").unwrap_or("(untitled)").to_string(),
            status: record.attr("status").unwrap_or(DEFAULT_STATUS).to_string(),
            assignee: record.attr("assignee").map(str::to_string),
            estimated_hours: record
                .attr("estimated_hours")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0.0),
            tags,
            created_at: record.attr("created_at").map(str::to_string),
        }
    }
}

// ============================================================================
// list-tasks
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListTasksParams {
    status: Option<String>,
    assignee: Option<String>,
}

fn list_tasks_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("list-tasks")
        .title("List tasks")
        .description("List every task on the board, optionally filtered by status or assignee")
        .schema(
            ArgumentSchema::new()
                .field(FieldSpec::string("status").describe("Only tasks with this status"))
                .field(FieldSpec::string("assignee").describe("Only tasks assigned to this person")),
        )
        .read_only()
        .widget(widget_spec("task-board").expect("task-board widget registered"))
        .build(list_tasks_handler)
}

async fn list_tasks_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListTasksParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let records = ctx
        .store
        .list_all(KIND_TASK)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    let tasks: Vec<TaskView> = records
        .iter()
        .map(TaskView::from_record)
        .filter(|task| {
            params
                .status
                .as_deref()
                .is_none_or(|status| task.status == status)
        })
        .filter(|task| {
            params
                .assignee
                .as_deref()
                .is_none_or(|assignee| task.assignee.as_deref() == Some(assignee))
        })
        .collect();

    let count = tasks.len();
    let summary = match count {
        1 => "1 task on the board".to_string(),
        n => format!("{} tasks on the board", n),
    };
    Ok(ToolOutput::with_payload(
        summary,
        json!({ "tasks": tasks, "count": count }),
    ))
}

// ============================================================================
// get-task
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetTaskParams {
    id: String,
}

fn get_task_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("get-task")
        .title("Get task")
        .description("Read a single task by id")
        .schema(
            ArgumentSchema::new()
                .field(FieldSpec::string("id").required().describe("Task identifier")),
        )
        .read_only()
        .widget(widget_spec("task-card").expect("task-card widget registered"))
        .build(get_task_handler)
}

async fn get_task_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetTaskParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let record = ctx
        .store
        .get_by_id(KIND_TASK, &params.id)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    match record {
        Some(record) => {
            let task = TaskView::from_record(&record);
            let summary = format!("Task {}: {}", task.id, task.title);
            Ok(ToolOutput::with_payload(summary, json!({ "task": task })))
        }
        None => Ok(ToolOutput::fail(format!("Task not found: {}", params.id))),
    }
}

// ============================================================================
// create-task
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    title: String,
    status: Option<String>,
    assignee: Option<String>,
    estimated_hours: Option<f64>,
    tags: Option<Vec<String>>,
}

fn create_task_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("create-task")
        .title("Create task")
        .description("Add a new task to the board")
        .schema(
            ArgumentSchema::new()
                .field(FieldSpec::string("title").required().describe("Task title"))
                .field(FieldSpec::string("status").describe("Initial status (default: todo)"))
                .field(FieldSpec::string("assignee").describe("Person responsible"))
                .field(
                    FieldSpec::new("estimated_hours", FieldKind::Number)
                        .describe("Estimated effort in hours"),
                )
                .field(FieldSpec::new("tags", FieldKind::StrArray).describe("Free-form labels")),
        )
        .widget(widget_spec("task-card").expect("task-card widget registered"))
        .build(create_task_handler)
}

async fn create_task_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: CreateTaskParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let id = Uuid::new_v4().to_string();
    let mut attrs = BTreeMap::new();
    attrs.insert("title".to_string(), params.title);
    attrs.insert(
        "status".to_string(),
        params.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
    );
    if let Some(assignee) = params.assignee {
        attrs.insert("assignee".to_string(), assignee);
    }
    if let Some(hours) = params.estimated_hours {
        attrs.insert("estimated_hours".to_string(), hours.to_string());
    }
    if let Some(tags) = params.tags {
        // Stored pre-serialized, the store treats it as an opaque string.
        attrs.insert(
            "tags".to_string(),
            serde_json::to_string(&tags).map_err(|e| McpError::InternalError(e.to_string()))?,
        );
    }
    attrs.insert("created_at".to_string(), Utc::now().to_rfc3339());

    ctx.store
        .create(KIND_TASK, &id, &attrs)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    let record = Record {
        id: id.clone(),
        attrs,
    };
    let task = TaskView::from_record(&record);
    let summary = format!("Created task {}: {}", task.id, task.title);
    Ok(ToolOutput::with_payload(summary, json!({ "task": task })))
}

// ============================================================================
// update-task
// ============================================================================

#[derive(Debug, Deserialize)]
struct UpdateTaskParams {
    id: String,
    title: Option<String>,
    status: Option<String>,
    assignee: Option<String>,
    estimated_hours: Option<f64>,
    tags: Option<Vec<String>>,
}

fn update_task_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("update-task")
        .title("Update task")
        .description("Patch fields on an existing task")
        .schema(
            ArgumentSchema::new()
                .field(FieldSpec::string("id").required().describe("Task identifier"))
                .field(FieldSpec::string("title"))
                .field(FieldSpec::string("status"))
                .field(FieldSpec::string("assignee"))
                .field(FieldSpec::new("estimated_hours", FieldKind::Number))
                .field(FieldSpec::new("tags", FieldKind::StrArray)),
        )
        .widget(widget_spec("task-card").expect("task-card widget registered"))
        .build(update_task_handler)
}

async fn update_task_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: UpdateTaskParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let mut patch = BTreeMap::new();
    if let Some(title) = params.title {
        patch.insert("title".to_string(), title);
    }
    if let Some(status) = params.status {
        patch.insert("status".to_string(), status);
    }
    if let Some(assignee) = params.assignee {
        patch.insert("assignee".to_string(), assignee);
    }
    if let Some(hours) = params.estimated_hours {
        patch.insert("estimated_hours".to_string(), hours.to_string());
    }
    if let Some(tags) = params.tags {
        patch.insert(
            "tags".to_string(),
            serde_json::to_string(&tags).map_err(|e| McpError::InternalError(e.to_string()))?,
        );
    }

    let found = ctx
        .store
        .update(KIND_TASK, &params.id, &patch)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;
    if !found {
        return Ok(ToolOutput::fail(format!("Task not found: {}", params.id)));
    }

    let record = ctx
        .store
        .get_by_id(KIND_TASK, &params.id)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?
        .ok_or_else(|| McpError::InternalError(format!("task vanished: {}", params.id)))?;

    let task = TaskView::from_record(&record);
    let summary = format!("Updated task {}", task.id);
    Ok(ToolOutput::with_payload(summary, json!({ "task": task })))
}

// ============================================================================
// delete-task
// ============================================================================

#[derive(Debug, Deserialize)]
struct DeleteTaskParams {
    id: String,
}

fn delete_task_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("delete-task")
        .title("Delete task")
        .description("Remove a task from the board")
        .schema(
            ArgumentSchema::new()
                .field(FieldSpec::string("id").required().describe("Task identifier")),
        )
        .destructive()
        .build(delete_task_handler)
}

async fn delete_task_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: DeleteTaskParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let found = ctx
        .store
        .delete(KIND_TASK, &params.id)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    if found {
        Ok(ToolOutput::ok(format!("Deleted task {}", params.id)))
    } else {
        Ok(ToolOutput::fail(format!("Task not found: {}", params.id)))
    }
}

// ============================================================================
// summarize-workload
// ============================================================================

#[derive(Debug, Serialize)]
struct AssigneeLoad {
    assignee: String,
    task_count: usize,
    total_hours: f64,
}

fn summarize_workload_tool() -> crate::mcp::catalog::ToolDescriptor {
    ToolBuilder::new("summarize-workload")
        .title("Summarize workload")
        .description("Aggregate task count and estimated hours per assignee")
        .read_only()
        .widget(widget_spec("workload-summary").expect("workload-summary widget registered"))
        .build(summarize_workload_handler)
}

async fn summarize_workload_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let records = ctx
        .store
        .list_all(KIND_TASK)
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    let mut by_assignee: BTreeMap<String, AssigneeLoad> = BTreeMap::new();
    let mut unassigned_count = 0usize;
    let mut total_hours = 0.0f64;

    for record in &records {
        let task = TaskView::from_record(record);
        total_hours += task.estimated_hours;
        match task.assignee {
            Some(assignee) => {
                let load = by_assignee
                    .entry(assignee.clone())
                    .or_insert_with(|| AssigneeLoad {
                        assignee,
                        task_count: 0,
                        total_hours: 0.0,
                    });
                load.task_count += 1;
                load.total_hours += task.estimated_hours;
            }
            None => unassigned_count += 1,
        }
    }

    let assignees: Vec<AssigneeLoad> = by_assignee.into_values().collect();
    let summary = format!(
        "{} tasks, {:.1} estimated hours across {} assignees",
        records.len(),
        total_hours,
        assignees.len()
    );
    Ok(ToolOutput::with_payload(
        summary,
        json!({
            "assignees": assignees,
            "unassigned_count": unassigned_count,
            "total_hours": total_hours,
        }),
    ))
}
