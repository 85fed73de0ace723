// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application context: the single `Arc` handed to every transport and
//! tool handler, plus the background tasks that keep it alive.
//!
//! A conventional Python port of this component would carry a runtime DI
//! container (see `di_container.py` in the original project) so handlers
//! can `get()` services by type at call time. Rust's ownership model makes
//! that indirection unnecessary: every handler already receives
//! `Arc<AppContext>` directly, which *is* the container, resolved once at
//! compile time instead of looked up at runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::client::Gns3Client;
use crate::config::Config;
use crate::console::ConsoleMultiplexer;
use crate::ssh_proxy::SshProxyClient;

/// Fixed backoff schedule for the background authentication loop, in
/// seconds. The last entry repeats once exhausted.
const AUTH_BACKOFF: [u64; 5] = [5, 10, 30, 60, 300];
/// Re-authentication interval once a session is established, to keep the
/// JWT from expiring under a long-lived mediator process.
const AUTH_KEEPALIVE: Duration = Duration::from_secs(300);
const CONSOLE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub struct AppContext {
    pub gns3: Arc<Gns3Client>,
    pub console: Arc<ConsoleMultiplexer>,
    pub ssh_proxy: Arc<SshProxyClient>,
    current_project_id: RwLock<Option<String>>,
    /// Per-node routing table to an SSH-proxy base URL, populated when an
    /// agent issues a `configure_ssh` call naming an explicit proxy. Falls
    /// back to `ssh_proxy`'s default base URL when a node has no entry.
    ssh_proxy_map: RwLock<HashMap<String, String>>,
}

impl AppContext {
    pub async fn current_project_id(&self) -> Option<String> {
        self.current_project_id.read().await.clone()
    }

    pub async fn set_current_project_id(&self, id: Option<String>) {
        *self.current_project_id.write().await = id;
    }

    /// Base URL to use for SSH-proxy calls targeting `node_name`: an
    /// explicitly configured proxy if one was set, otherwise the default.
    pub async fn ssh_proxy_base_url(&self, node_name: &str) -> String {
        self.ssh_proxy_map
            .read()
            .await
            .get(node_name)
            .cloned()
            .unwrap_or_else(|| self.ssh_proxy.default_base_url().to_string())
    }

    pub async fn set_ssh_proxy(&self, node_name: &str, base_url: String) {
        self.ssh_proxy_map.write().await.insert(node_name.to_string(), base_url);
    }
}

/// Everything `main` needs to run the mediator and shut it down cleanly.
pub struct Prepared {
    pub app: Arc<AppContext>,
    pub cancel: CancellationToken,
    auth_task: tokio::task::JoinHandle<()>,
    cleanup_task: tokio::task::JoinHandle<()>,
}

impl Prepared {
    /// Cancel background tasks and release emulator-side resources. Safe
    /// to call once; awaiting twice is harmless but unnecessary.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.auth_task.await;
        let _ = self.cleanup_task.await;
        self.app.console.close_all().await;
    }
}

/// Build the shared application state and spawn its background tasks.
/// Authentication happens in the background so the transport can start
/// accepting connections immediately even if the GNS3 server isn't up yet.
pub fn prepare(config: &Config) -> Prepared {
    let gns3 = Arc::new(Gns3Client::new(
        config.base_url(),
        config.username.clone().unwrap_or_default(),
        config.password.clone().unwrap_or_default(),
        config.verify_ssl,
    ));
    let console = Arc::new(ConsoleMultiplexer::new());
    let ssh_proxy = Arc::new(SshProxyClient::new(config.ssh_proxy_base_url()));
    let app = Arc::new(AppContext {
        gns3,
        console,
        ssh_proxy,
        current_project_id: RwLock::new(None),
        ssh_proxy_map: RwLock::new(HashMap::new()),
    });

    let cancel = CancellationToken::new();

    let auth_task = tokio::spawn(background_authentication(app.clone(), cancel.clone()));
    let cleanup_task = tokio::spawn(periodic_console_cleanup(app.clone(), cancel.clone()));

    tracing::info!("mediator ready (authentication proceeding in the background)");

    Prepared {
        app,
        cancel,
        auth_task,
        cleanup_task,
    }
}

async fn background_authentication(app: Arc<AppContext>, cancel: CancellationToken) {
    let mut attempt = 0usize;
    loop {
        match app.gns3.authenticate().await {
            Ok(()) => {
                tracing::info!("authenticated to GNS3 server");
                auto_detect_project(&app).await;
                attempt = 0;
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(AUTH_KEEPALIVE) => {}
                }
            }
            Err(err) => {
                let delay = AUTH_BACKOFF[attempt.min(AUTH_BACKOFF.len() - 1)];
                tracing::warn!(error = %err, delay_seconds = delay, "authentication failed, retrying");
                attempt += 1;
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
                }
            }
        }

        if cancel.is_cancelled() {
            return;
        }
    }
}

/// If no project is currently selected, adopt the single `opened` project
/// as a convenience. More than one opened project is ambiguous and is left
/// for the agent to resolve with `open_project`.
async fn auto_detect_project(app: &AppContext) {
    if app.current_project_id().await.is_some() {
        return;
    }

    let projects = match app.gns3.get_projects().await {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(error = %err, "could not list projects for auto-detect");
            return;
        }
    };

    let opened: Vec<&serde_json::Value> = projects
        .iter()
        .filter(|p| p.get("status").and_then(serde_json::Value::as_str) == Some("opened"))
        .collect();

    match opened.as_slice() {
        [] => {}
        [single] => {
            if let Some(id) = single.get("project_id").and_then(serde_json::Value::as_str) {
                tracing::info!(project_id = id, "auto-detected the only opened project");
                app.set_current_project_id(Some(id.to_string())).await;
            }
        }
        many => {
            tracing::warn!(count = many.len(), "multiple projects are opened, skipping auto-detect");
        }
    }
}

async fn periodic_console_cleanup(app: Arc<AppContext>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(CONSOLE_SWEEP_INTERVAL) => {}
        }
        app.console.cleanup_expired().await;
    }
}

/// Builds an [`AppContext`] wired to a loopback `base_url`/`ssh_proxy` with
/// no background tasks running, for handler-level tests elsewhere in the
/// crate that need an `AppContext` but not a live GNS3 server.
#[cfg(test)]
pub(crate) fn test_app(gns3_base_url: &str, ssh_proxy_base_url: &str) -> AppContext {
    AppContext {
        gns3: Arc::new(Gns3Client::new(gns3_base_url.to_string(), "admin".to_string(), "secret".to_string(), true)),
        console: Arc::new(ConsoleMultiplexer::new()),
        ssh_proxy: Arc::new(SshProxyClient::new(ssh_proxy_base_url.to_string())),
        current_project_id: RwLock::new(None),
        ssh_proxy_map: RwLock::new(HashMap::new()),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
