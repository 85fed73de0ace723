// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::SshProxyClient;
use crate::error::ErrorCode;

#[test]
fn default_base_url_is_stored_verbatim() {
    let client = SshProxyClient::new("http://localhost:8022".to_string());
    assert_eq!(client.default_base_url(), "http://localhost:8022");
}

#[tokio::test]
async fn unreachable_proxy_yields_ssh_connection_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SshProxyClient::new(format!("http://{addr}"));
    let err = client.health(client.default_base_url()).await.unwrap_err();
    assert_eq!(err.error_code, ErrorCode::SshConnectionFailed);
}
