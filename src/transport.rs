// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two surfaces agents can reach the mediator through: line-framed
//! JSON over stdio, and a single `POST /mcp/` over HTTP guarded by an
//! `MCP_API_KEY` header. Both funnel into [`crate::handlers::dispatch`];
//! neither has any tool-specific logic of its own.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::handlers;

/// Constant-time comparison so an invalid API key can't be brute-forced by
/// timing the mismatch.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// The HTTP transport is guarded by a literal `MCP_API_KEY` header, not a
/// standard `Authorization: Bearer` one — matching the tool-invocation
/// framework's own convention for this header name.
fn validate_api_key(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get("MCP_API_KEY")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| constant_time_eq(token, expected))
}

/// Drives the stdio transport: one JSON object per line in, one JSON object
/// per line out, until stdin closes. Malformed lines get an `ErrorRecord`
/// back rather than killing the process.
pub async fn run_stdio(app: Arc<AppContext>) {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdio read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolCall>(&line) {
            Ok(call) => handlers::dispatch(&app, &call.tool_name, call.arguments.unwrap_or(json!({}))).await,
            Err(e) => json!({
                "error": "could not parse request line as JSON",
                "error_code": "INVALID_PARAMETER",
                "details": e.to_string(),
            }),
        };

        let mut out = serde_json::to_vec(&response).unwrap_or_else(|_| b"{}".to_vec());
        out.push(b'\n');
        if stdout.write_all(&out).await.is_err() || stdout.flush().await.is_err() {
            tracing::error!("stdio write failed, stopping transport");
            break;
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    tool_name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

struct HttpState {
    app: Arc<AppContext>,
    api_key: String,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn call_tool(State(state): State<Arc<HttpState>>, Json(call): Json<ToolCall>) -> impl IntoResponse {
    Json(handlers::dispatch(&state.app, &call.tool_name, call.arguments.unwrap_or(json!({}))).await)
}

async fn require_api_key(State(state): State<Arc<HttpState>>, headers: HeaderMap, req: axum::extract::Request, next: Next) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }
    if !validate_api_key(&headers, &state.api_key) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing or invalid MCP_API_KEY header", "error_code": "AUTH_FAILED" })),
        )
            .into_response();
    }
    next.run(req).await
}

/// Build the HTTP transport's router: `GET /health` (no auth) and
/// `POST /mcp/` (`MCP_API_KEY`-guarded tool dispatch).
pub fn build_router(app: Arc<AppContext>, api_key: String) -> Router {
    let state = Arc::new(HttpState { app, api_key });
    Router::new()
        .route("/mcp/", post(call_tool))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
