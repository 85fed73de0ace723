// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the SSH-proxy sidecar.
//!
//! The sidecar is an external collaborator: it owns SSH session execution
//! and traffic-widget rendering. This client only proxies requests to it and
//! re-wraps failures into the mediator's error taxonomy; it has no
//! reimplementation of SSH itself.

use std::time::Duration;

use serde_json::Value;

use crate::error::{ErrorCode, ErrorRecord, MediatorResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SshProxyClient {
    http: reqwest::Client,
    default_base_url: String,
}

impl SshProxyClient {
    pub fn new(default_base_url: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            default_base_url,
        }
    }

    pub fn default_base_url(&self) -> &str {
        &self.default_base_url
    }

    async fn get(&self, base_url: &str, path: &str) -> MediatorResult<Value> {
        let url = format!("{base_url}{path}");
        let resp = self.http.get(&url).send().await.map_err(|e| {
            ErrorRecord::new(ErrorCode::SshConnectionFailed, "could not reach SSH proxy")
                .with_details(e.to_string())
                .with_context("url", url.clone())
        })?;
        self.parse_response(resp).await
    }

    async fn post(&self, base_url: &str, path: &str, body: &Value) -> MediatorResult<Value> {
        let url = format!("{base_url}{path}");
        let resp = self.http.post(&url).json(body).send().await.map_err(|e| {
            ErrorRecord::new(ErrorCode::SshConnectionFailed, "could not reach SSH proxy")
                .with_details(e.to_string())
                .with_context("url", url.clone())
        })?;
        self.parse_response(resp).await
    }

    async fn parse_response(&self, resp: reqwest::Response) -> MediatorResult<Value> {
        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            return Err(ErrorRecord::new(ErrorCode::SshConnectionFailed, "SSH proxy returned an error")
                .with_details(message)
                .with_context("status", status.as_u16()));
        }
        if resp.content_length() == Some(0) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        resp.json().await.or_else(|_| Ok(Value::Object(serde_json::Map::new())))
    }

    pub async fn health(&self, base_url: &str) -> MediatorResult<Value> {
        self.get(base_url, "/health").await
    }

    pub async fn registry(&self, base_url: &str) -> MediatorResult<Value> {
        self.get(base_url, "/proxy/registry").await
    }

    pub async fn sessions(&self, base_url: &str) -> MediatorResult<Value> {
        self.get(base_url, "/ssh/sessions").await
    }

    pub async fn status(&self, base_url: &str, node_name: &str) -> MediatorResult<Value> {
        self.get(base_url, &format!("/ssh/status/{node_name}")).await
    }

    pub async fn history(&self, base_url: &str, node_name: &str) -> MediatorResult<Value> {
        self.get(base_url, &format!("/ssh/history/{node_name}")).await
    }

    pub async fn buffer(&self, base_url: &str, node_name: &str) -> MediatorResult<Value> {
        self.get(base_url, &format!("/ssh/buffer/{node_name}")).await
    }

    pub async fn execute_ssh(&self, base_url: &str, payload: &Value) -> MediatorResult<Value> {
        self.post(base_url, "/ssh", payload).await
    }

    pub async fn execute_tftp(&self, base_url: &str, payload: &Value) -> MediatorResult<Value> {
        self.post(base_url, "/tftp", payload).await
    }

    pub async fn execute_http_client(&self, base_url: &str, payload: &Value) -> MediatorResult<Value> {
        self.post(base_url, "/http-client", payload).await
    }
}

#[cfg(test)]
#[path = "ssh_proxy_tests.rs"]
mod tests;
