// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LinkValidator;
use crate::error::ErrorCode;
use crate::model::{AdapterSpec, Link, LinkEndpoint, Node, NodeStatus, Port};

fn node(name: &str, id: &str, ports: Vec<Port>) -> Node {
    Node {
        node_id: id.to_string(),
        name: name.to_string(),
        node_type: "dynamips".to_string(),
        status: NodeStatus::Started,
        console_type: None,
        console: None,
        console_host: None,
        compute_id: "local".to_string(),
        x: 0,
        y: 0,
        z: 0,
        locked: false,
        ports: Some(ports),
        ram: None,
        cpus: None,
        adapters: None,
        hdd_disk_image: None,
        hda_disk_image: None,
    }
}

fn port(adapter: u32, port_num: u32, name: &str) -> Port {
    Port {
        adapter_number: adapter,
        port_number: port_num,
        name: Some(name.to_string()),
        port_name: None,
        adapter_type: None,
    }
}

fn link(id: &str, a_node: &str, a_adapter: u32, a_port: u32, b_node: &str, b_adapter: u32, b_port: u32) -> Link {
    Link {
        link_id: id.to_string(),
        link_type: "ethernet".to_string(),
        nodes: [
            LinkEndpoint {
                node_id: a_node.to_string(),
                node_name: String::new(),
                adapter_number: a_adapter,
                port_number: a_port,
                port_name: None,
                adapter_type: None,
            },
            LinkEndpoint {
                node_id: b_node.to_string(),
                node_name: String::new(),
                adapter_number: b_adapter,
                port_number: b_port,
                port_name: None,
                adapter_type: None,
            },
        ],
        capturing: false,
        suspend: false,
    }
}

#[test]
fn validate_connect_succeeds_for_free_ports() {
    let nodes = vec![
        node("R1", "n1", vec![port(0, 0, "eth0")]),
        node("R2", "n2", vec![port(0, 0, "eth0")]),
    ];
    let v = LinkValidator::new(nodes, vec![]);
    let usage = v.port_usage_snapshot();
    assert!(v.validate_connect(&usage, "R1", "R2", 0, 0, 0, 0).is_ok());
}

#[test]
fn validate_connect_rejects_unknown_node() {
    let v = LinkValidator::new(vec![node("R1", "n1", vec![port(0, 0, "eth0")])], vec![]);
    let usage = v.port_usage_snapshot();
    let err = v.validate_connect(&usage, "R1", "Ghost", 0, 0, 0, 0).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::NodeNotFound);
}

#[test]
fn validate_connect_rejects_port_already_in_use() {
    let nodes = vec![
        node("R1", "n1", vec![port(0, 0, "eth0")]),
        node("R2", "n2", vec![port(0, 0, "eth0")]),
        node("R3", "n3", vec![port(0, 0, "eth0")]),
    ];
    let links = vec![link("l1", "n1", 0, 0, "n2", 0, 0)];
    let v = LinkValidator::new(nodes, links);
    let usage = v.port_usage_snapshot();
    let err = v.validate_connect(&usage, "R1", "R3", 0, 0, 0, 0).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::PortInUse);
    assert!(err.suggested_action.unwrap().contains("l1"));
}

#[test]
fn validate_connect_rejects_nonexistent_port() {
    let nodes = vec![
        node("R1", "n1", vec![port(0, 0, "eth0")]),
        node("R2", "n2", vec![port(0, 0, "eth0")]),
    ];
    let v = LinkValidator::new(nodes, vec![]);
    let usage = v.port_usage_snapshot();
    let err = v.validate_connect(&usage, "R1", "R2", 5, 0, 0, 0).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::InvalidPort);
}

#[test]
fn batch_disconnect_then_reconnect_same_port_fails_on_connect() {
    // An existing link occupies R1(0,0)<->R2(0,0). Phase-1 validation walks
    // the whole batch against one immutable snapshot taken at batch start,
    // so a disconnect earlier in the same batch does not free the port for
    // a later connect: the connect still sees the port as in use.
    let nodes = vec![
        node("R1", "n1", vec![port(0, 0, "eth0")]),
        node("R2", "n2", vec![port(0, 0, "eth0")]),
    ];
    let links = vec![link("l1", "n1", 0, 0, "n2", 0, 0)];
    let v = LinkValidator::new(nodes, links);
    v.validate_disconnect("l1").expect("l1 exists");

    let usage = v.port_usage_snapshot();
    let err = v.validate_connect(&usage, "R1", "R2", 0, 0, 0, 0).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::PortInUse);
}

#[test]
fn batch_two_connects_to_same_port_conflict() {
    // Two connect ops targeting the same never-before-used port in one
    // batch must conflict on the second, even though the initial snapshot
    // shows the port free.
    let nodes = vec![
        node("R1", "n1", vec![port(0, 0, "eth0")]),
        node("R2", "n2", vec![port(0, 0, "eth0")]),
        node("R3", "n3", vec![port(0, 0, "eth0")]),
    ];
    let v = LinkValidator::new(nodes, vec![]);
    let mut usage = v.port_usage_snapshot();
    v.validate_connect(&usage, "R1", "R2", 0, 0, 0, 0).expect("first connect is free");
    usage.entry("n1".to_string()).or_default().entry(0).or_default().insert(0);
    usage.entry("n2".to_string()).or_default().entry(0).or_default().insert(0);

    let err = v.validate_connect(&usage, "R1", "R3", 0, 0, 0, 0).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::PortInUse);
}

#[test]
fn validate_disconnect_rejects_unknown_link() {
    let v = LinkValidator::new(vec![], vec![]);
    let err = v.validate_disconnect("nope").unwrap_err();
    assert_eq!(err.error_code, ErrorCode::LinkNotFound);
}

#[test]
fn resolve_adapter_by_number_passes_through() {
    let v = LinkValidator::new(vec![node("R1", "n1", vec![port(0, 0, "eth0")])], vec![]);
    let (num, name) = v.resolve_adapter("R1", &AdapterSpec::Number(3)).unwrap();
    assert_eq!(num, 3);
    assert!(name.is_none());
}

#[test]
fn resolve_adapter_by_name_looks_up_port() {
    let v = LinkValidator::new(vec![node("R1", "n1", vec![port(2, 0, "GigabitEthernet0/0")])], vec![]);
    let (num, name) = v.resolve_adapter("R1", &AdapterSpec::Name("GigabitEthernet0/0".to_string())).unwrap();
    assert_eq!(num, 2);
    assert_eq!(name.as_deref(), Some("GigabitEthernet0/0"));
}

#[test]
fn resolve_adapter_by_unknown_name_fails() {
    let v = LinkValidator::new(vec![node("R1", "n1", vec![port(0, 0, "eth0")])], vec![]);
    let err = v.resolve_adapter("R1", &AdapterSpec::Name("eth9".to_string())).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::InvalidAdapter);
}

#[test]
fn resolve_adapter_by_name_without_port_info_fails_distinctly() {
    // A node that publishes no port list at all gets a dedicated message,
    // distinct from "name not found among known ports".
    let mut unvalidated = node("R1", "n1", vec![]);
    unvalidated.ports = None;
    let v = LinkValidator::new(vec![unvalidated], vec![]);
    let err = v.resolve_adapter("R1", &AdapterSpec::Name("eth0".to_string())).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::InvalidAdapter);
    assert!(err.error.contains("no port information available"));
}
