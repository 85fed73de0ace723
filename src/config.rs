// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, ValueEnum};

/// Which side an agent talks to the mediator on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
}

/// Log output format, mirroring `tracing_subscriber`'s two usable layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Mediator process configuration, parsed once at startup from CLI flags
/// and environment variables.
#[derive(Debug, Parser)]
#[command(name = "gns3mcp", version, about = "MCP mediator for a GNS3 network-emulation server")]
pub struct Config {
    /// GNS3 server hostname or address.
    #[arg(long, env = "GNS3_HOST", default_value = "localhost")]
    pub host: String,

    /// GNS3 server port.
    #[arg(long, env = "GNS3_PORT", default_value_t = 3080)]
    pub port: u16,

    /// GNS3 username.
    #[arg(long, env = "GNS3_USERNAME")]
    pub username: Option<String>,

    /// GNS3 password. Prefer the PASSWORD/GNS3_PASSWORD environment
    /// variables over this flag, which is visible in process listings.
    #[arg(long, env = "GNS3_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Default base URL for the SSH-proxy sidecar. Individual nodes can be
    /// routed elsewhere at runtime via `configure_ssh`'s `proxy` argument.
    #[arg(long, env = "SSH_PROXY_URL")]
    pub ssh_proxy_url: Option<String>,

    /// Speak HTTPS to the GNS3 server instead of plain HTTP.
    #[arg(long, env = "GNS3_USE_HTTPS", default_value_t = false)]
    pub use_https: bool,

    /// Verify the GNS3 server's TLS certificate.
    #[arg(long, env = "GNS3_VERIFY_SSL", default_value_t = true)]
    pub verify_ssl: bool,

    /// Which transport the mediator exposes to agents.
    #[arg(long, value_enum, env = "MCP_TRANSPORT", default_value = "stdio")]
    pub transport: Transport,

    /// Bind address for the HTTP transport.
    #[arg(long, env = "MCP_HTTP_HOST", default_value = "127.0.0.1")]
    pub http_host: String,

    /// Bind port for the HTTP transport.
    #[arg(long, env = "MCP_HTTP_PORT", default_value_t = 8765)]
    pub http_port: u16,

    /// Bearer key required on `POST /mcp/` when the HTTP transport is in use.
    #[arg(long, env = "MCP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log output format.
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Log verbosity, passed straight through to `tracing_subscriber::EnvFilter`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// `clap`'s `env` attribute only binds one variable name; `PASSWORD` is
    /// a second accepted spelling, checked here since `--password` already
    /// won any conflict with `GNS3_PASSWORD` during parsing.
    pub fn resolve_password_fallback(&mut self) {
        if self.password.is_none() {
            if let Ok(p) = std::env::var("PASSWORD") {
                self.password = Some(p);
            }
        }
    }

    /// Cross-field validation that can't be expressed with `clap` alone.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.password.is_none() {
            anyhow::bail!("no password configured: set --password, PASSWORD, or GNS3_PASSWORD");
        }
        if self.transport == Transport::Http && self.api_key.is_none() {
            anyhow::bail!("MCP_API_KEY (or --api-key) is required when --transport=http");
        }
        if !self.verify_ssl {
            tracing::warn!("TLS certificate verification is disabled (--verify-ssl=false)");
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Default SSH-proxy sidecar base URL: explicit `--ssh-proxy-url` or
    /// `host:8022` alongside the GNS3 server.
    pub fn ssh_proxy_base_url(&self) -> String {
        self.ssh_proxy_url.clone().unwrap_or_else(|| format!("http://{}:8022", self.host))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
