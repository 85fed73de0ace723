// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console session multiplexer: one telnet-style TCP connection per node,
//! fed into a growing buffer that agents read from independently of the
//! background ingestion task.
//!
//! Raw bytes are kept as received; [`crate::ansi::strip`] is applied only
//! at read time (see that module's doc comment), so a future reader can
//! still get at the untouched stream if one is ever added. Outbound
//! newline normalization is deliberately *not* done here: it is a
//! tool-handler-level concern (component E) so this module stays a plain
//! byte pipe.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ansi;
use crate::error::{ErrorCode, ErrorRecord, MediatorResult};

/// Buffer is trimmed to half of this once it grows past it. Matches the
/// emulator-side console manager this mediator stands in front of.
const MAX_BUFFER_SIZE: usize = 10 * 1024 * 1024;
/// A session with no read/write activity for this long is swept by
/// `cleanup_expired`.
const SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const READ_CHUNK: usize = 4096;
/// How long `disconnect`/`close_all` wait for a cancelled ingestion task to
/// unwind before giving up on it and moving on.
const INGEST_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct SessionState {
    buffer: Vec<u8>,
    cursor: usize,
    accessed: bool,
    last_activity: Instant,
    alive: bool,
}

pub struct ConsoleSession {
    pub session_id: String,
    pub node_name: String,
    pub host: String,
    pub port: u16,
    pub created_at: DateTime<Utc>,
    state: AsyncMutex<SessionState>,
    writer: AsyncMutex<tokio::net::tcp::OwnedWriteHalf>,
    /// Cancels this session's background ingestion task.
    cancel: CancellationToken,
    /// Set once the ingestion task is spawned; awaited (with a grace
    /// timeout) by `disconnect`/`close_all` after `cancel` fires.
    ingest_handle: AsyncMutex<Option<JoinHandle<()>>>,
}

impl ConsoleSession {
    fn touch(state: &mut SessionState) {
        state.last_activity = Instant::now();
    }
}

/// Snapshot of a session's public state, for `list_sessions`/`get_console_status`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub node_name: String,
    pub host: String,
    pub port: u16,
    pub buffer_size: usize,
    pub created_at: String,
    pub accessed: bool,
}

/// The session map and the node-name index, behind one lock.
///
/// Both maps are mutated together so a single mutex governs them: an entry
/// in `by_node` always has a matching entry in `sessions`.
#[derive(Default)]
struct Index {
    sessions: HashMap<String, Arc<ConsoleSession>>,
    by_node: HashMap<String, String>,
}

/// Owns every live console session, keyed by session ID, with a secondary
/// node-name index maintaining a 1:1 bijection: a node can have at most one
/// session, and a session belongs to exactly one node.
#[derive(Default)]
pub struct ConsoleMultiplexer {
    index: AsyncMutex<Index>,
}

impl ConsoleMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_session(&self, node_name: &str) -> bool {
        self.index.lock().await.by_node.contains_key(node_name)
    }

    pub async fn get_session_id(&self, node_name: &str) -> Option<String> {
        self.index.lock().await.by_node.get(node_name).cloned()
    }

    /// Connect to a node's console, reusing a live session for this node if
    /// one exists (idempotent connect).
    ///
    /// The TCP handshake happens without the lock held, so two overlapping
    /// calls for the same node race each other to open a stream; whichever
    /// installs its session first under the lock wins, and the loser closes
    /// its own stream and adopts the winner's id.
    pub async fn connect(&self, host: &str, port: u16, node_name: &str) -> MediatorResult<String> {
        if let Some(existing) = self.get_session_id(node_name).await {
            return Ok(existing);
        }

        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            ErrorRecord::new(ErrorCode::ConsoleConnectionFailed, "could not connect to node console")
                .with_details(e.to_string())
                .with_context("host", host)
                .with_context("port", port)
        })?;
        let (mut read_half, write_half) = stream.into_split();

        let session_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let session = Arc::new(ConsoleSession {
            session_id: session_id.clone(),
            node_name: node_name.to_string(),
            host: host.to_string(),
            port,
            created_at: Utc::now(),
            state: AsyncMutex::new(SessionState {
                buffer: Vec::new(),
                cursor: 0,
                accessed: false,
                last_activity: Instant::now(),
                alive: true,
            }),
            writer: AsyncMutex::new(write_half),
            cancel: cancel.clone(),
            ingest_handle: AsyncMutex::new(None),
        });

        {
            let mut index = self.index.lock().await;
            if let Some(existing) = index.by_node.get(node_name).cloned() {
                drop(index);
                let mut writer = session.writer.lock().await;
                let _ = writer.shutdown().await;
                tracing::debug!(node_name, %session_id, "lost connect race, adopting existing session");
                return Ok(existing);
            }
            index.sessions.insert(session_id.clone(), session.clone());
            index.by_node.insert(node_name.to_string(), session_id.clone());
        }

        let ingest_session = session.clone();
        let ingest_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let session = ingest_session;
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                let read = tokio::select! {
                    _ = ingest_cancel.cancelled() => break,
                    read = read_half.read(&mut chunk) => read,
                };
                match read {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut state = session.state.lock().await;
                        state.buffer.extend_from_slice(&chunk[..n]);
                        if state.buffer.len() > MAX_BUFFER_SIZE {
                            let keep_from = state.buffer.len() / 2;
                            state.buffer.drain(..keep_from);
                            // Unconditional reset: a reader mid-diff loses its
                            // place on trim rather than risk an out-of-range cursor.
                            state.cursor = 0;
                        }
                        ConsoleSession::touch(&mut state);
                    }
                    Err(_) => break,
                }
                // Cooperative yield so a burst of small reads on one session
                // doesn't starve the scheduler's other tasks.
                tokio::task::yield_now().await;
            }
            let mut state = session.state.lock().await;
            state.alive = false;
        });
        *session.ingest_handle.lock().await = Some(handle);

        tracing::debug!(node_name, %session_id, "console session connected");
        Ok(session_id)
    }

    async fn session_by_node(&self, node_name: &str) -> Option<Arc<ConsoleSession>> {
        let index = self.index.lock().await;
        let session_id = index.by_node.get(node_name)?;
        index.sessions.get(session_id).cloned()
    }

    pub async fn send_by_node(&self, node_name: &str, data: &str) -> bool {
        let Some(session) = self.session_by_node(node_name).await else {
            return false;
        };
        let mut writer = session.writer.lock().await;
        if writer.write_all(data.as_bytes()).await.is_err() {
            return false;
        }
        let mut state = session.state.lock().await;
        ConsoleSession::touch(&mut state);
        true
    }

    pub async fn get_output_by_node(&self, node_name: &str) -> Option<String> {
        let session = self.session_by_node(node_name).await?;
        let mut state = session.state.lock().await;
        state.accessed = true;
        ConsoleSession::touch(&mut state);
        Some(ansi::strip(&state.buffer))
    }

    /// Returns only what has arrived since the last diff read, advancing
    /// the read cursor.
    pub async fn get_diff_by_node(&self, node_name: &str) -> Option<String> {
        let session = self.session_by_node(node_name).await?;
        let mut state = session.state.lock().await;
        state.accessed = true;
        ConsoleSession::touch(&mut state);
        let cursor = state.cursor.min(state.buffer.len());
        let fresh = ansi::strip(&state.buffer[cursor..]);
        state.cursor = state.buffer.len();
        Some(fresh)
    }

    pub async fn has_accessed_terminal_by_node(&self, node_name: &str) -> bool {
        match self.session_by_node(node_name).await {
            Some(session) => session.state.lock().await.accessed,
            None => false,
        }
    }

    pub async fn disconnect_by_node(&self, node_name: &str) -> bool {
        let Some(session_id) = self.get_session_id(node_name).await else {
            return false;
        };
        self.disconnect(&session_id).await
    }

    async fn disconnect(&self, session_id: &str) -> bool {
        let mut index = self.index.lock().await;
        let removed = index.sessions.remove(session_id);
        if let Some(session) = &removed {
            index.by_node.remove(&session.node_name);
            drop(index);
            {
                let mut writer = session.writer.lock().await;
                let _ = writer.shutdown().await;
            }
            session.cancel.cancel();
            let handle = session.ingest_handle.lock().await.take();
            if let Some(handle) = handle {
                if tokio::time::timeout(INGEST_SHUTDOWN_GRACE, handle).await.is_err() {
                    tracing::warn!(node_name = %session.node_name, %session_id, "ingestion task did not stop within grace period");
                }
            }
        }
        removed.is_some()
    }

    /// Sweep sessions idle for longer than [`SESSION_TIMEOUT`] or whose
    /// ingestion task has observed EOF. Run on a 5-minute timer by
    /// `context::periodic_console_cleanup`.
    pub async fn cleanup_expired(&self) {
        let expired: Vec<String> = {
            let index = self.index.lock().await;
            let mut expired = Vec::new();
            for (id, session) in index.sessions.iter() {
                let state = session.state.lock().await;
                if !state.alive || state.last_activity.elapsed() > SESSION_TIMEOUT {
                    expired.push(id.clone());
                }
            }
            expired
        };
        for id in expired {
            self.disconnect(&id).await;
        }
    }

    pub async fn close_all(&self) {
        let ids: Vec<String> = self.index.lock().await.sessions.keys().cloned().collect();
        for id in ids {
            self.disconnect(&id).await;
        }
    }

    pub async fn list_sessions(&self) -> HashMap<String, SessionInfo> {
        let index = self.index.lock().await;
        let mut out = HashMap::with_capacity(index.sessions.len());
        for (id, session) in index.sessions.iter() {
            let state = session.state.lock().await;
            out.insert(
                id.clone(),
                SessionInfo {
                    session_id: id.clone(),
                    node_name: session.node_name.clone(),
                    host: session.host.clone(),
                    port: session.port,
                    buffer_size: state.buffer.len(),
                    created_at: session.created_at.to_rfc3339(),
                    accessed: state.accessed,
                },
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
