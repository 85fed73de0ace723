// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use super::AppContext;
use crate::client::Gns3Client;
use crate::console::ConsoleMultiplexer;
use crate::ssh_proxy::SshProxyClient;

fn app() -> AppContext {
    AppContext {
        gns3: Arc::new(Gns3Client::new(
            "http://localhost:3080".to_string(),
            "admin".to_string(),
            "secret".to_string(),
            true,
        )),
        console: Arc::new(ConsoleMultiplexer::new()),
        ssh_proxy: Arc::new(SshProxyClient::new("http://localhost:8022".to_string())),
        current_project_id: tokio::sync::RwLock::new(None),
        ssh_proxy_map: tokio::sync::RwLock::new(HashMap::new()),
    }
}

#[tokio::test]
async fn current_project_id_starts_unset() {
    let app = app();
    assert_eq!(app.current_project_id().await, None);
}

#[tokio::test]
async fn current_project_id_round_trips() {
    let app = app();
    app.set_current_project_id(Some("p1".to_string())).await;
    assert_eq!(app.current_project_id().await, Some("p1".to_string()));

    app.set_current_project_id(None).await;
    assert_eq!(app.current_project_id().await, None);
}

#[tokio::test]
async fn ssh_proxy_base_url_falls_back_to_default() {
    let app = app();
    assert_eq!(app.ssh_proxy_base_url("R1").await, "http://localhost:8022");

    app.set_ssh_proxy("R1", "http://10.0.0.5:8022".to_string()).await;
    assert_eq!(app.ssh_proxy_base_url("R1").await, "http://10.0.0.5:8022");
    assert_eq!(app.ssh_proxy_base_url("R2").await, "http://localhost:8022");
}
