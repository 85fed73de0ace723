// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed error-code taxonomy and the envelope every tool handler
//! converts its failures into before they cross the transport boundary.
//!
//! Handlers never let a raw language error escape to the agent; they catch
//! and re-wrap as an [`ErrorRecord`].

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Not found (404-style)
    ProjectNotFound,
    NodeNotFound,
    LinkNotFound,
    TemplateNotFound,
    DrawingNotFound,
    SnapshotNotFound,

    // Validation (400-style)
    InvalidParameter,
    MissingParameter,
    PortInUse,
    NodeRunning,
    NodeStopped,
    InvalidNodeState,
    InvalidAdapter,
    InvalidPort,

    // Connection (503-style)
    Gns3Unreachable,
    Gns3ApiError,
    ConsoleDisconnected,
    ConsoleConnectionFailed,
    SshConnectionFailed,
    SshDisconnected,

    // Auth (401-style)
    AuthFailed,
    TokenExpired,
    InvalidCredentials,

    // Internal (500-style)
    InternalError,
    Timeout,
    OperationFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::NodeNotFound => "NODE_NOT_FOUND",
            Self::LinkNotFound => "LINK_NOT_FOUND",
            Self::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            Self::DrawingNotFound => "DRAWING_NOT_FOUND",
            Self::SnapshotNotFound => "SNAPSHOT_NOT_FOUND",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::PortInUse => "PORT_IN_USE",
            Self::NodeRunning => "NODE_RUNNING",
            Self::NodeStopped => "NODE_STOPPED",
            Self::InvalidNodeState => "INVALID_NODE_STATE",
            Self::InvalidAdapter => "INVALID_ADAPTER",
            Self::InvalidPort => "INVALID_PORT",
            Self::Gns3Unreachable => "GNS3_UNREACHABLE",
            Self::Gns3ApiError => "GNS3_API_ERROR",
            Self::ConsoleDisconnected => "CONSOLE_DISCONNECTED",
            Self::ConsoleConnectionFailed => "CONSOLE_CONNECTION_FAILED",
            Self::SshConnectionFailed => "SSH_CONNECTION_FAILED",
            Self::SshDisconnected => "SSH_DISCONNECTED",
            Self::AuthFailed => "AUTH_FAILED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::OperationFailed => "OPERATION_FAILED",
        }
    }

    /// The HTTP-status family this code maps to, for transports that need one.
    pub fn http_status(self) -> u16 {
        use ErrorCode::*;
        match self {
            ProjectNotFound | NodeNotFound | LinkNotFound | TemplateNotFound
            | DrawingNotFound | SnapshotNotFound => 404,
            InvalidParameter | MissingParameter | PortInUse | NodeRunning | NodeStopped
            | InvalidNodeState | InvalidAdapter | InvalidPort => 400,
            Gns3Unreachable | Gns3ApiError | ConsoleDisconnected | ConsoleConnectionFailed
            | SshConnectionFailed | SshDisconnected => 503,
            AuthFailed | TokenExpired | InvalidCredentials => 401,
            InternalError | Timeout | OperationFailed => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical error envelope returned to the agent on any handler failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub error: String,
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
    pub server_version: String,
    pub timestamp: String,
}

impl ErrorRecord {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            error_code: code,
            details: None,
            suggested_action: None,
            context: serde_json::Map::new(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_suggested_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "error": self.error,
                "error_code": self.error_code.as_str(),
            })
        })
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.error)
    }
}

impl std::error::Error for ErrorRecord {}

/// Result alias used by the internal components (A, B, C) so call sites can
/// match on `ErrorCode` without downcasting an `anyhow::Error`.
pub type MediatorResult<T> = Result<T, ErrorRecord>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
