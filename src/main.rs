// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gns3mcp::config::{Config, LogFormat, Transport};

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not install SIGTERM handler, watching SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Exit codes: 0 normal, 130 keyboard interrupt, 1 fatal init error.
#[tokio::main]
async fn main() {
    let mut config = Config::parse();
    config.resolve_password_fallback();
    init_logging(&config);

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let prepared = gns3mcp::context::prepare(&config);
    let app = prepared.app.clone();

    let exit_code = match config.transport {
        Transport::Stdio => {
            tokio::select! {
                _ = gns3mcp::transport::run_stdio(app) => 0,
                _ = wait_for_shutdown_signal() => 130,
            }
        }
        Transport::Http => {
            // `Config::validate` already rejects a missing API key for this
            // transport, so this is unreachable in practice.
            let api_key = match &config.api_key {
                Some(k) => k.clone(),
                None => {
                    eprintln!("error: --api-key (or MCP_API_KEY) is required for --transport=http");
                    prepared.shutdown().await;
                    std::process::exit(1);
                }
            };
            let router = gns3mcp::transport::build_router(app, api_key);
            let addr = format!("{}:{}", config.http_host, config.http_port);
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(error = %e, %addr, "could not bind HTTP transport");
                    prepared.shutdown().await;
                    std::process::exit(1);
                }
            };
            tracing::info!(%addr, "HTTP transport listening");
            tokio::select! {
                result = axum::serve(listener, router) => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "HTTP server failed");
                        1
                    } else {
                        0
                    }
                }
                _ = wait_for_shutdown_signal() => 130,
            }
        }
    };

    prepared.shutdown().await;
    std::process::exit(exit_code);
}
