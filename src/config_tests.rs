// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::{Config, Transport};

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn valid_config_with_password() -> anyhow::Result<()> {
    let config = parse(&["gns3mcp", "--password", "secret"]);
    config.validate()?;
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 3080);
    Ok(())
}

#[test]
fn invalid_no_password() {
    let config = parse(&["gns3mcp"]);
    let err = config.validate().unwrap_err();
    assert!(
        err.to_string().contains("no password configured"),
        "unexpected error: {err}"
    );
}

#[test]
fn http_transport_requires_api_key() {
    let config = parse(&["gns3mcp", "--password", "secret", "--transport", "http"]);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("MCP_API_KEY"), "unexpected error: {err}");
}

#[test]
fn http_transport_with_api_key_is_valid() -> anyhow::Result<()> {
    let config = parse(&[
        "gns3mcp",
        "--password",
        "secret",
        "--transport",
        "http",
        "--api-key",
        "k",
    ]);
    config.validate()?;
    assert_eq!(config.transport, Transport::Http);
    Ok(())
}

#[test]
fn base_url_defaults_to_http() {
    let config = parse(&["gns3mcp", "--password", "secret"]);
    assert_eq!(config.base_url(), "http://localhost:3080");
}

#[test]
fn base_url_respects_https_flag() {
    let config = parse(&["gns3mcp", "--password", "secret", "--use-https"]);
    assert_eq!(config.base_url(), "https://localhost:3080");
}

#[test]
fn ssh_proxy_base_url_defaults_alongside_host() {
    let config = parse(&["gns3mcp", "--password", "secret", "--host", "gns3.lan"]);
    assert_eq!(config.ssh_proxy_base_url(), "http://gns3.lan:8022");
}

#[test]
fn ssh_proxy_base_url_respects_explicit_override() {
    let config = parse(&["gns3mcp", "--password", "secret", "--ssh-proxy-url", "http://proxy:9000"]);
    assert_eq!(config.ssh_proxy_base_url(), "http://proxy:9000");
}

#[test]
fn defaults_are_correct() {
    let config = parse(&["gns3mcp", "--password", "secret"]);
    assert_eq!(config.transport, Transport::Stdio);
    assert!(config.verify_ssl);
    assert_eq!(config.http_host, "127.0.0.1");
    assert_eq!(config.http_port, 8765);
    assert_eq!(config.log_level, "info");
}
