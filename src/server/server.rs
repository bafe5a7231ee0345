//! Transport Front Door
//!
//! The HTTP-facing shell: applies origin access control, parses and
//! serializes the wire envelope, and runs each request through a fresh
//! dispatcher inside a lifecycle scope.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::lifecycle::RequestScope;
use super::metrics;
use super::origin::OriginPolicy;
use crate::mcp::protocol::{McpError, McpRequest, McpResponse, MCP_PROTOCOL_VERSION};
use crate::mcp::widgets::WidgetConfig;
use crate::mcp::{Dispatcher, ToolContext};
use crate::record_store::RecordStore;

/// Headers the protocol recognizes. The session id is always ignored:
/// stateless mode has no sessions to negotiate.
const HEADER_PROTOCOL_VERSION: &str = "mcp-protocol-version";
const HEADER_SESSION_ID: &str = "mcp-session-id";

/// Process-wide immutable state shared by all connections. Everything
/// per-request (dispatcher, catalog) is built inside the handlers.
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    pub origin_policy: Arc<OriginPolicy>,
    pub widgets: WidgetConfig,
    pub version: String,
}

impl ServerState {
    fn tool_context(&self) -> ToolContext {
        ToolContext {
            store: self.store.clone(),
            widgets: self.widgets.clone(),
            server_version: self.version.clone(),
        }
    }
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": state.version,
    }))
}

/// `POST /mcp`: one JSON-RPC envelope in, one out. Notifications (no id)
/// are accepted with 202 and no body.
async fn post_mcp(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Some(session_id) = headers.get(HEADER_SESSION_ID) {
        // Stateless mode has no sessions to negotiate.
        debug!("Ignoring session id header: {:?}", session_id);
    }

    let payload: Value = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            let error = McpResponse::error(None, McpError::ParseError(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    if !payload.is_object() {
        let error = McpResponse::error(
            None,
            McpError::InvalidRequest("request must be a JSON object".to_string()),
        );
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    }

    if payload.get("id").is_none() {
        // Client notification; nothing to answer.
        return StatusCode::ACCEPTED.into_response();
    }

    let request: McpRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => {
            let error = McpResponse::error(None, McpError::InvalidRequest(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    let scope = RequestScope::begin(&request.method);

    // A brand-new dispatcher and catalog per request: no state survives
    // across requests, so there is nothing to leak between callers.
    let dispatcher = Dispatcher::new(state.tool_context());
    let response = dispatcher.dispatch(request).await;

    scope.finish(if response.error.is_some() { "error" } else { "ok" });

    (
        StatusCode::OK,
        [(HEADER_PROTOCOL_VERSION, MCP_PROTOCOL_VERSION)],
        Json(response),
    )
        .into_response()
}

/// `GET /mcp`: stateless transport offers no server-initiated stream.
async fn get_mcp() -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": {
            "code": -32000,
            "message": "Method not allowed: stateless transport",
        },
    });
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

/// `DELETE /mcp`: session teardown probe. There is never a session to
/// tear down, so the probe trivially succeeds.
async fn delete_mcp() -> Response {
    (StatusCode::OK, Json(json!({}))).into_response()
}

/// Origin access control plus CORS reflection.
///
/// Denied origins get an empty 403 (no body leaked) and a server-side log
/// line. Allowed origins are reflected verbatim; credentials are never
/// requested.
async fn enforce_origin(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if !state.origin_policy.is_allowed(origin.as_deref()) {
        metrics::ORIGIN_DENIED_TOTAL.inc();
        warn!(
            "Rejected request from disallowed origin: {}",
            origin.as_deref().unwrap_or("<none>")
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    let mut response = if request.method() == Method::OPTIONS {
        // Preflight is answered here; it never reaches the router.
        (
            StatusCode::NO_CONTENT,
            [
                (
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    "POST, GET, DELETE, OPTIONS",
                ),
                (
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    "content-type, mcp-protocol-version, mcp-session-id",
                ),
                (header::ACCESS_CONTROL_MAX_AGE, "86400"),
            ],
        )
            .into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = origin {
        if let Ok(value) = HeaderValue::from_str(&origin) {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            headers.insert(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("mcp-protocol-version, mcp-session-id"),
            );
        }
    }
    response
}

pub fn make_app(state: ServerState) -> Router {
    metrics::register_metrics();

    Router::new()
        .route("/mcp", get(get_mcp).post(post_mcp).delete(delete_mcp))
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), enforce_origin))
        .with_state(state)
}

pub async fn run_server(state: ServerState, port: u16) -> Result<()> {
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
