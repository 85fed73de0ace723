// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    project_not_found = { ErrorCode::ProjectNotFound, 404, "PROJECT_NOT_FOUND" },
    node_not_found = { ErrorCode::NodeNotFound, 404, "NODE_NOT_FOUND" },
    invalid_parameter = { ErrorCode::InvalidParameter, 400, "INVALID_PARAMETER" },
    port_in_use = { ErrorCode::PortInUse, 400, "PORT_IN_USE" },
    gns3_unreachable = { ErrorCode::Gns3Unreachable, 503, "GNS3_UNREACHABLE" },
    auth_failed = { ErrorCode::AuthFailed, 401, "AUTH_FAILED" },
    internal_error = { ErrorCode::InternalError, 500, "INTERNAL_ERROR" },
    timeout = { ErrorCode::Timeout, 500, "TIMEOUT" },
)]
fn error_code_mapping(code: ErrorCode, status: u16, as_str: &str) {
    assert_eq!(code.http_status(), status);
    assert_eq!(code.as_str(), as_str);
    assert_eq!(code.to_string(), as_str);
}

#[test]
fn record_carries_optional_fields_only_when_set() {
    let bare = ErrorRecord::new(ErrorCode::NodeNotFound, "no such node");
    let json = bare.to_json();
    assert!(json.get("details").is_none());
    assert!(json.get("suggested_action").is_none());

    let full = ErrorRecord::new(ErrorCode::NodeNotFound, "no such node")
        .with_details("node 'R9' is not present in the current project")
        .with_suggested_action("call list_nodes() for case-sensitive names")
        .with_context("node_name", "R9");
    let json = full.to_json();
    assert_eq!(json["details"], "node 'R9' is not present in the current project");
    assert_eq!(json["suggested_action"], "call list_nodes() for case-sensitive names");
    assert_eq!(json["context"]["node_name"], "R9");
}

#[test]
fn record_always_has_version_and_timestamp() {
    let record = ErrorRecord::new(ErrorCode::Timeout, "timed out");
    assert_eq!(record.server_version, env!("CARGO_PKG_VERSION"));
    assert!(!record.timestamp.is_empty());
    assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
}
