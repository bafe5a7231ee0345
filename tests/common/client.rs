//! HTTP client for end-to-end tests
//!
//! This module provides a high-level client that wraps reqwest and speaks
//! the JSON-RPC envelope to the `/mcp` endpoint.
//!
//! When the wire format changes, update only this file.

use std::time::Duration;

use reqwest::Response;
use serde_json::{json, Value};

use super::constants::*;

/// HTTP test client speaking JSON-RPC over stateless POSTs
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // JSON-RPC envelope helpers
    // ========================================================================

    /// POST /mcp with a full JSON-RPC request (id 1), raw response back.
    pub async fn rpc_raw(&self, method: &str, params: Value) -> Response {
        self.post_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            })
            .to_string(),
        )
        .await
    }

    /// POST /mcp and parse the JSON-RPC envelope, asserting HTTP 200.
    pub async fn rpc(&self, method: &str, params: Value) -> Value {
        let response = self.rpc_raw(method, params).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "rpc '{}' failed",
            method
        );
        response.json().await.expect("Malformed JSON-RPC response")
    }

    /// POST /mcp and return the envelope's `result`, asserting no error.
    pub async fn rpc_result(&self, method: &str, params: Value) -> Value {
        let envelope = self.rpc(method, params).await;
        assert!(
            envelope.get("error").is_none(),
            "rpc '{}' returned error: {}",
            method,
            envelope["error"]
        );
        envelope["result"].clone()
    }

    /// tools/call shorthand, returning the call result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.rpc_result("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    /// resources/read shorthand, returning the read result.
    pub async fn read_resource(&self, uri: &str) -> Value {
        self.rpc_result("resources/read", json!({"uri": uri})).await
    }

    // ========================================================================
    // Raw transport access
    // ========================================================================

    /// POST /mcp with an arbitrary body (malformed payload tests).
    pub async fn post_body(&self, body: String) -> Response {
        self.client
            .post(format!("{}/mcp", self.base_url))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("POST /mcp failed")
    }

    /// POST /mcp with an Origin header attached.
    pub async fn post_with_origin(&self, body: String, origin: &str) -> Response {
        self.client
            .post(format!("{}/mcp", self.base_url))
            .header("content-type", "application/json")
            .header("origin", origin)
            .body(body)
            .send()
            .await
            .expect("POST /mcp failed")
    }

    /// OPTIONS /mcp preflight with an Origin header.
    pub async fn preflight(&self, origin: &str) -> Response {
        self.client
            .request(reqwest::Method::OPTIONS, format!("{}/mcp", self.base_url))
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .send()
            .await
            .expect("OPTIONS /mcp failed")
    }

    /// GET /mcp (stateless transport rejects it).
    pub async fn get_mcp(&self) -> Response {
        self.client
            .get(format!("{}/mcp", self.base_url))
            .send()
            .await
            .expect("GET /mcp failed")
    }

    /// DELETE /mcp (session teardown probe).
    pub async fn delete_mcp(&self) -> Response {
        self.client
            .delete(format!("{}/mcp", self.base_url))
            .send()
            .await
            .expect("DELETE /mcp failed")
    }

    /// GET /health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("GET /health failed")
    }

    /// GET /metrics
    pub async fn metrics(&self) -> Response {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await
            .expect("GET /metrics failed")
    }
}

/// A minimal JSON-RPC ping body, shared by transport-level tests.
pub fn ping_body() -> String {
    json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string()
}
