// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Async HTTP client for the GNS3 v3 controller API.
//!
//! One [`Gns3Client`] is built per process and shared behind an `Arc` by
//! [`crate::context::AppContext`]. It owns the JWT obtained at
//! authentication time and refreshes nothing on its own; the background
//! authentication loop in `context` is what keeps it alive across restarts
//! of the GNS3 server.

use std::sync::RwLock;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;

use crate::error::{ErrorCode, ErrorRecord, MediatorResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const LINK_TIMEOUT: Duration = Duration::from_secs(10);
/// Each background authentication attempt gets a short timeout so a
/// downed GNS3 server doesn't stall the retry loop's own backoff clock.
const AUTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Thin wrapper over `reqwest` that knows how to reach one GNS3 server.
pub struct Gns3Client {
    http: reqwest::Client,
    pub base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

impl Gns3Client {
    pub fn new(base_url: String, username: String, password: String, verify_ssl: bool) -> Self {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url,
            username,
            password,
            token: RwLock::new(None),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Log in and obtain a JWT. With `retry = true`, keeps retrying on a
    /// fixed schedule owned by the caller (see `context::background_authentication`);
    /// this method itself makes a single attempt.
    pub async fn authenticate(&self) -> MediatorResult<()> {
        let url = format!("{}/v3/access/users/authenticate", self.base_url);
        tracing::debug!(url = %url, "authenticating to GNS3 server");

        let resp = self
            .http
            .post(&url)
            .timeout(AUTH_TIMEOUT)
            .json(&json!({ "username": self.username, "password": self.password }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "GNS3 server unreachable during authentication");
                ErrorRecord::new(ErrorCode::Gns3Unreachable, "could not reach GNS3 server")
                    .with_details(e.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(%status, "authentication rejected by GNS3 server");
            return Err(ErrorRecord::new(ErrorCode::AuthFailed, "authentication rejected")
                .with_details(format!("HTTP {status}")));
        }

        let body: Value = resp.json().await.map_err(|e| {
            ErrorRecord::new(ErrorCode::Gns3ApiError, "malformed authentication response")
                .with_details(e.to_string())
        })?;

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ErrorRecord::new(ErrorCode::AuthFailed, "authentication response missing token")
            })?
            .to_string();

        *self.token.write().unwrap_or_else(|p| p.into_inner()) = Some(token);
        tracing::debug!("authenticated to GNS3 server");
        Ok(())
    }

    fn token(&self) -> MediatorResult<String> {
        self.token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| ErrorRecord::new(ErrorCode::AuthFailed, "not authenticated"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v3{}", self.base_url, path)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> MediatorResult<reqwest::Response> {
        let token = self.token()?;
        tracing::debug!(%method, %path, "gns3 api request");

        let mut req = self
            .http
            .request(method, self.url(path))
            .timeout(timeout)
            .bearer_auth(token);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::error!(error = %e, %path, "GNS3 server unreachable");
            ErrorRecord::new(ErrorCode::Gns3Unreachable, "could not reach GNS3 server")
                .with_details(e.to_string())
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            // Prefer a JSON `message` field over the raw body, per the
            // controller's own error convention; fall back to the body
            // verbatim when it isn't JSON or has no such field.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            tracing::warn!(%status, %path, %message, "GNS3 API returned an error");
            return Err(ErrorRecord::new(ErrorCode::Gns3ApiError, format!("GNS3 API error on {path}"))
                .with_details(message)
                .with_context("status", status.as_u16()));
        }

        Ok(resp)
    }

    /// Parses a response body as JSON, treating an empty body (204, or a
    /// 2xx with nothing written) as an empty object rather than a parse
    /// failure.
    async fn parse_body(resp: reqwest::Response) -> MediatorResult<Value> {
        let text = resp.text().await.map_err(|e| {
            ErrorRecord::new(ErrorCode::Gns3ApiError, "could not read GNS3 response body").with_details(e.to_string())
        })?;
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text).map_err(|e| {
            ErrorRecord::new(ErrorCode::Gns3ApiError, "malformed GNS3 response").with_details(e.to_string())
        })
    }

    async fn get_json(&self, path: &str) -> MediatorResult<Value> {
        let resp = self.request(reqwest::Method::GET, path, None, DEFAULT_TIMEOUT).await?;
        Self::parse_body(resp).await
    }

    async fn post_json(&self, path: &str, body: &Value, timeout: Duration) -> MediatorResult<Value> {
        let resp = self.request(reqwest::Method::POST, path, Some(body), timeout).await?;
        Self::parse_body(resp).await
    }

    async fn put_json(&self, path: &str, body: &Value) -> MediatorResult<Value> {
        let resp = self.request(reqwest::Method::PUT, path, Some(body), DEFAULT_TIMEOUT).await?;
        Self::parse_body(resp).await
    }

    async fn delete(&self, path: &str, timeout: Duration) -> MediatorResult<()> {
        self.request(reqwest::Method::DELETE, path, None, timeout).await?;
        Ok(())
    }

    // --- Project operations ---

    pub async fn get_projects(&self) -> MediatorResult<Vec<Value>> {
        Ok(self.get_json("/projects").await?.as_array().cloned().unwrap_or_default())
    }

    pub async fn create_project(&self, name: &str, path: Option<&str>) -> MediatorResult<Value> {
        let mut body = json!({ "name": name });
        if let Some(p) = path {
            body["path"] = json!(p);
        }
        self.post_json("/projects", &body, DEFAULT_TIMEOUT).await
    }

    pub async fn open_project(&self, project_id: &str) -> MediatorResult<Value> {
        self.post_json(&format!("/projects/{project_id}/open"), &json!({}), DEFAULT_TIMEOUT)
            .await
    }

    pub async fn close_project(&self, project_id: &str) -> MediatorResult<Value> {
        self.post_json(&format!("/projects/{project_id}/close"), &json!({}), DEFAULT_TIMEOUT)
            .await
    }

    pub async fn get_snapshots(&self, project_id: &str) -> MediatorResult<Vec<Value>> {
        Ok(self
            .get_json(&format!("/projects/{project_id}/snapshots"))
            .await?
            .as_array()
            .cloned()
            .unwrap_or_default())
    }

    // --- Node operations ---

    pub async fn get_nodes(&self, project_id: &str) -> MediatorResult<Vec<Value>> {
        Ok(self
            .get_json(&format!("/projects/{project_id}/nodes"))
            .await?
            .as_array()
            .cloned()
            .unwrap_or_default())
    }

    pub async fn start_node(&self, project_id: &str, node_id: &str) -> MediatorResult<Value> {
        self.post_json(
            &format!("/projects/{project_id}/nodes/{node_id}/start"),
            &json!({}),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn stop_node(&self, project_id: &str, node_id: &str) -> MediatorResult<Value> {
        self.post_json(
            &format!("/projects/{project_id}/nodes/{node_id}/stop"),
            &json!({}),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn suspend_node(&self, project_id: &str, node_id: &str) -> MediatorResult<Value> {
        self.post_json(
            &format!("/projects/{project_id}/nodes/{node_id}/suspend"),
            &json!({}),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn reload_node(&self, project_id: &str, node_id: &str) -> MediatorResult<Value> {
        self.post_json(
            &format!("/projects/{project_id}/nodes/{node_id}/reload"),
            &json!({}),
            DEFAULT_TIMEOUT,
        )
        .await
    }

    pub async fn update_node(&self, project_id: &str, node_id: &str, properties: &Value) -> MediatorResult<Value> {
        self.put_json(&format!("/projects/{project_id}/nodes/{node_id}"), properties)
            .await
    }

    pub async fn delete_node(&self, project_id: &str, node_id: &str) -> MediatorResult<()> {
        self.delete(&format!("/projects/{project_id}/nodes/{node_id}"), DEFAULT_TIMEOUT)
            .await
    }

    // --- Link operations ---

    pub async fn get_links(&self, project_id: &str) -> MediatorResult<Vec<Value>> {
        Ok(self
            .get_json(&format!("/projects/{project_id}/links"))
            .await?
            .as_array()
            .cloned()
            .unwrap_or_default())
    }

    pub async fn create_link(&self, project_id: &str, link_spec: &Value) -> MediatorResult<Value> {
        self.post_json(&format!("/projects/{project_id}/links"), link_spec, LINK_TIMEOUT)
            .await
    }

    pub async fn delete_link(&self, project_id: &str, link_id: &str) -> MediatorResult<()> {
        self.delete(&format!("/projects/{project_id}/links/{link_id}"), LINK_TIMEOUT)
            .await
    }

    // --- Template operations ---

    pub async fn get_templates(&self) -> MediatorResult<Vec<Value>> {
        Ok(self.get_json("/templates").await?.as_array().cloned().unwrap_or_default())
    }

    pub async fn get_template(&self, template_id: &str) -> MediatorResult<Value> {
        self.get_json(&format!("/templates/{template_id}")).await
    }

    pub async fn create_node_from_template(
        &self,
        project_id: &str,
        template_id: &str,
        payload: &Value,
    ) -> MediatorResult<Value> {
        self.post_json(
            &format!("/projects/{project_id}/templates/{template_id}"),
            payload,
            DEFAULT_TIMEOUT,
        )
        .await
    }

    // --- Drawing operations ---

    pub async fn get_drawings(&self, project_id: &str) -> MediatorResult<Vec<Value>> {
        Ok(self
            .get_json(&format!("/projects/{project_id}/drawings"))
            .await?
            .as_array()
            .cloned()
            .unwrap_or_default())
    }

    pub async fn create_drawing(&self, project_id: &str, drawing_data: &Value) -> MediatorResult<Value> {
        self.post_json(&format!("/projects/{project_id}/drawings"), drawing_data, DEFAULT_TIMEOUT)
            .await
    }

    pub async fn update_drawing(
        &self,
        project_id: &str,
        drawing_id: &str,
        drawing_data: &Value,
    ) -> MediatorResult<Value> {
        self.put_json(&format!("/projects/{project_id}/drawings/{drawing_id}"), drawing_data)
            .await
    }

    pub async fn delete_drawing(&self, project_id: &str, drawing_id: &str) -> MediatorResult<()> {
        self.delete(&format!("/projects/{project_id}/drawings/{drawing_id}"), DEFAULT_TIMEOUT)
            .await
    }

    // --- File operations ---

    pub async fn get_node_file(&self, project_id: &str, node_id: &str, file_path: &str) -> MediatorResult<String> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/projects/{project_id}/nodes/{node_id}/files/{file_path}"),
                None,
                DEFAULT_TIMEOUT,
            )
            .await?;
        resp.text().await.map_err(|e| {
            ErrorRecord::new(ErrorCode::Gns3ApiError, "could not read file response body")
                .with_details(e.to_string())
        })
    }

    pub async fn write_node_file(
        &self,
        project_id: &str,
        node_id: &str,
        file_path: &str,
        content: &str,
    ) -> MediatorResult<()> {
        let token = self.token()?;
        self.http
            .post(self.url(&format!("/projects/{project_id}/nodes/{node_id}/files/{file_path}")))
            .timeout(DEFAULT_TIMEOUT)
            .bearer_auth(token)
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| {
                ErrorRecord::new(ErrorCode::Gns3Unreachable, "could not reach GNS3 server")
                    .with_details(e.to_string())
            })?;
        Ok(())
    }

    pub async fn get_project_readme(&self, project_id: &str) -> MediatorResult<String> {
        match self
            .request(
                reqwest::Method::GET,
                &format!("/projects/{project_id}/files/README.txt"),
                None,
                DEFAULT_TIMEOUT,
            )
            .await
        {
            Ok(resp) => resp.text().await.map_err(|e| {
                ErrorRecord::new(ErrorCode::Gns3ApiError, "could not read README response body")
                    .with_details(e.to_string())
            }),
            Err(e) if e.error_code == ErrorCode::Gns3ApiError && e.context.get("status").and_then(Value::as_u64) == Some(404) => {
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_project_readme(&self, project_id: &str, content: &str) -> MediatorResult<()> {
        let token = self.token()?;
        self.http
            .post(self.url(&format!("/projects/{project_id}/files/README.txt")))
            .timeout(DEFAULT_TIMEOUT)
            .bearer_auth(token)
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| {
                ErrorRecord::new(ErrorCode::Gns3Unreachable, "could not reach GNS3 server")
                    .with_details(e.to_string())
            })?;
        Ok(())
    }

    // --- Symbol operations ---

    pub async fn get_symbol_raw(&self, symbol_id: &str) -> MediatorResult<Vec<u8>> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/symbols/{symbol_id}/raw"), None, DEFAULT_TIMEOUT)
            .await?;
        Ok(resp.bytes().await.map(|b| b.to_vec()).map_err(|e| {
            ErrorRecord::new(ErrorCode::Gns3ApiError, "could not read symbol response body")
                .with_details(e.to_string())
        })?)
    }

    pub async fn get_version(&self) -> MediatorResult<Value> {
        self.get_json("/version").await
    }
}

/// Sleep helper split out so tests can assert against the real schedule
/// without actually sleeping in `context::background_authentication`.
pub async fn backoff_sleep(seconds: u64) {
    sleep(Duration::from_secs(seconds)).await;
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
