// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::ConsoleMultiplexer;

async fn echo_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind echo server");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if socket.write_all(&buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });
    (addr, handle)
}

#[tokio::test]
async fn connect_send_and_diff_round_trip() {
    let (addr, _server) = echo_server().await;
    let mux = ConsoleMultiplexer::new();

    mux.connect(&addr.ip().to_string(), addr.port(), "R1")
        .await
        .expect("connect should succeed");
    assert!(mux.has_session("R1").await);

    assert!(mux.send_by_node("R1", "show version\r\n").await);

    // Give the background ingestion task a moment to see the echoed bytes.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let diff = mux.get_diff_by_node("R1").await.expect("session exists");
    assert!(diff.contains("show version"));
    assert!(mux.has_accessed_terminal_by_node("R1").await);

    // A second diff read with no new output is empty, not the whole buffer.
    let second = mux.get_diff_by_node("R1").await.expect("session exists");
    assert!(second.is_empty());
}

#[tokio::test]
async fn connecting_twice_to_same_node_is_idempotent() {
    let (addr, _server) = echo_server().await;
    let mux = ConsoleMultiplexer::new();

    let first = mux.connect(&addr.ip().to_string(), addr.port(), "R1").await.unwrap();
    let second = mux.connect(&addr.ip().to_string(), addr.port(), "R1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(mux.get_session_id("R1").await, Some(second));
}

#[tokio::test]
async fn overlapping_connects_to_same_node_converge_on_one_session() {
    // Two overlapping connect() calls return the same session id, and
    // exactly one ingestion task survives for that id.
    let (addr, _server) = echo_server().await;
    let mux = std::sync::Arc::new(ConsoleMultiplexer::new());

    let host = addr.ip().to_string();
    let port = addr.port();
    let a = {
        let mux = mux.clone();
        let host = host.clone();
        tokio::spawn(async move { mux.connect(&host, port, "R1").await })
    };
    let b = { tokio::spawn(async move { mux.connect(&host, port, "R1").await }) };

    let (a, b) = tokio::join!(a, b);
    let a = a.unwrap().unwrap();
    let b = b.unwrap().unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn disconnect_by_node_removes_the_bijection() {
    let (addr, _server) = echo_server().await;
    let mux = ConsoleMultiplexer::new();

    mux.connect(&addr.ip().to_string(), addr.port(), "R1").await.unwrap();
    assert!(mux.disconnect_by_node("R1").await);
    assert!(!mux.has_session("R1").await);
    assert!(!mux.disconnect_by_node("R1").await);
}

#[tokio::test]
async fn close_all_does_not_wait_for_peer_eof() {
    // The peer here never closes its end and never sends anything, so an
    // ingestion task that only gave up on EOF would block forever. close_all
    // must still return promptly via the per-session cancellation signal.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let _server = tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            // Hold the connection open without reading or writing.
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            drop(socket);
        }
    });

    let mux = ConsoleMultiplexer::new();
    mux.connect(&addr.ip().to_string(), addr.port(), "R1").await.expect("connect");

    let closed = tokio::time::timeout(std::time::Duration::from_secs(5), mux.close_all()).await;
    assert!(closed.is_ok(), "close_all should return well before the peer ever closes its side");
    assert!(!mux.has_session("R1").await);
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mux = ConsoleMultiplexer::new();
    let err = mux.connect(&addr.ip().to_string(), addr.port(), "R1").await.unwrap_err();
    assert_eq!(err.error_code, crate::error::ErrorCode::ConsoleConnectionFailed);
}
