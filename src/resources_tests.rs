// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::parse_uri;

#[test]
fn matches_projects_list() {
    let (handler, _) = parse_uri("projects://").expect("should match");
    assert_eq!(handler, "list_projects");
}

#[test]
fn matches_project_with_captured_id() {
    let (handler, caps) = parse_uri("projects://abc123").expect("should match");
    assert_eq!(handler, "get_project");
    assert_eq!(caps.name("project_id").unwrap().as_str(), "abc123");
}

#[test]
fn matches_node_with_two_captures() {
    let (handler, caps) = parse_uri("projects://abc123/nodes/n1").expect("should match");
    assert_eq!(handler, "get_node");
    assert_eq!(caps.name("project_id").unwrap().as_str(), "abc123");
    assert_eq!(caps.name("node_id").unwrap().as_str(), "n1");
}

#[test]
fn matches_topology() {
    let (handler, caps) = parse_uri("projects://abc123/topology").expect("should match");
    assert_eq!(handler, "get_topology");
    assert_eq!(caps.name("project_id").unwrap().as_str(), "abc123");
}

#[test]
fn matches_console_session_list_and_node() {
    assert_eq!(parse_uri("sessions://console/").unwrap().0, "list_console_sessions");
    let (handler, caps) = parse_uri("sessions://console/R1").expect("should match");
    assert_eq!(handler, "get_console_session");
    assert_eq!(caps.name("node_name").unwrap().as_str(), "R1");
}

#[test]
fn unknown_uri_does_not_match() {
    assert!(parse_uri("not-a-uri").is_none());
    assert!(parse_uri("projects://abc123/nodes/n1/extra/unknown").is_none());
}

#[test]
fn matches_node_template() {
    let (handler, caps) = parse_uri("projects://abc123/nodes/n1/template").expect("should match");
    assert_eq!(handler, "get_node_template");
    assert_eq!(caps.name("project_id").unwrap().as_str(), "abc123");
    assert_eq!(caps.name("node_id").unwrap().as_str(), "n1");
}

#[test]
fn matches_ssh_sessions() {
    assert_eq!(parse_uri("sessions://ssh/").unwrap().0, "list_ssh_sessions");

    let (handler, caps) = parse_uri("sessions://ssh/R1").expect("should match");
    assert_eq!(handler, "get_ssh_session");
    assert_eq!(caps.name("node_name2").unwrap().as_str(), "R1");

    assert_eq!(parse_uri("sessions://ssh/R1/history").unwrap().0, "get_ssh_history");
    assert_eq!(parse_uri("sessions://ssh/R1/buffer").unwrap().0, "get_ssh_buffer");
}

#[test]
fn matches_proxies() {
    assert_eq!(parse_uri("proxies://").unwrap().0, "list_proxies");
    let (handler, caps) = parse_uri("proxies://lab-1").expect("should match");
    assert_eq!(handler, "get_proxy");
    assert_eq!(caps.name("proxy_id").unwrap().as_str(), "lab-1");
}
