// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use super::build_router;
use crate::context;

fn router() -> axum::Router {
    let app = Arc::new(context::test_app("http://127.0.0.1:1", "http://127.0.0.1:1"));
    build_router(app, "secret-key".to_string())
}

#[tokio::test]
async fn health_requires_no_auth() {
    let server = axum_test::TestServer::new(router()).unwrap();
    let resp = server.get("/health").await;
    resp.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn mcp_rejects_missing_api_key() {
    let server = axum_test::TestServer::new(router()).unwrap();
    let resp = server.post("/mcp/").json(&json!({ "tool_name": "list_projects" })).await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mcp_rejects_wrong_api_key() {
    let server = axum_test::TestServer::new(router()).unwrap();
    let resp = server
        .post("/mcp/")
        .add_header("MCP_API_KEY", "wrong-key")
        .json(&json!({ "tool_name": "list_projects" }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mcp_dispatches_with_valid_api_key() {
    let server = axum_test::TestServer::new(router()).unwrap();
    let resp = server
        .post("/mcp/")
        .add_header("MCP_API_KEY", "secret-key")
        .json(&json!({ "tool_name": "not_a_real_tool" }))
        .await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body.get("error_code").and_then(|v| v.as_str()), Some("INVALID_PARAMETER"));
}
