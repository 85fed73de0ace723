// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative schemas for entities exchanged with agents and parsed from
//! the emulator's HTTP API.
//!
//! These are intentionally permissive: the emulator is a third-party
//! service that has added fields across releases, so every model favors
//! `Option`/`#[serde(default)]` over strict deserialization. Unknown JSON
//! fields are ignored rather than rejected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_true")]
    pub auto_close: bool,
    #[serde(default)]
    pub auto_open: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Started,
    Stopped,
    Suspended,
}

/// A single addressable interface on a node.
///
/// `(adapter_number, port_number)` is the canonical address; `name` is a
/// convenience that may repeat across nodes but not within one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub adapter_number: u32,
    pub port_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port_name: Option<String>,
    #[serde(default)]
    pub adapter_type: Option<String>,
}

impl Port {
    /// The port's human label, preferring `name` over the legacy
    /// `port_name` alias some emulator releases emit.
    pub fn canonical_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.port_name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub node_id: String,
    pub name: String,
    pub node_type: String,
    pub status: NodeStatus,
    #[serde(default)]
    pub console_type: Option<String>,
    #[serde(default)]
    pub console: Option<u16>,
    #[serde(default)]
    pub console_host: Option<String>,
    #[serde(default = "default_compute_id")]
    pub compute_id: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub ports: Option<Vec<Port>>,
    #[serde(default)]
    pub ram: Option<u32>,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub adapters: Option<u32>,
    #[serde(default)]
    pub hdd_disk_image: Option<String>,
    #[serde(default)]
    pub hda_disk_image: Option<String>,
}

fn default_compute_id() -> String {
    "local".to_string()
}

impl Node {
    pub fn console_endpoint(&self) -> Option<(String, u16)> {
        let host = self.console_host.clone().unwrap_or_else(|| "localhost".to_string());
        self.console.map(|port| (host, port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEndpoint {
    pub node_id: String,
    #[serde(default)]
    pub node_name: String,
    pub adapter_number: u32,
    pub port_number: u32,
    #[serde(default)]
    pub port_name: Option<String>,
    #[serde(default)]
    pub adapter_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub link_id: String,
    #[serde(default = "default_link_type")]
    pub link_type: String,
    pub nodes: [LinkEndpoint; 2],
    #[serde(default)]
    pub capturing: bool,
    #[serde(default)]
    pub suspend: bool,
}

fn default_link_type() -> String {
    "ethernet".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub template_id: String,
    pub name: String,
    pub template_type: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    pub drawing_id: String,
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub z: i32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub rotation: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One leg of a batched link mutation request as submitted by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ConnectionOperation {
    Connect {
        node_a: String,
        node_b: String,
        port_a: u32,
        port_b: u32,
        #[serde(default)]
        adapter_a: AdapterSpec,
        #[serde(default)]
        adapter_b: AdapterSpec,
    },
    Disconnect { link_id: String },
}

/// An adapter may be addressed by number or by the port's human name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdapterSpec {
    Number(u32),
    Name(String),
}

impl Default for AdapterSpec {
    fn default() -> Self {
        AdapterSpec::Number(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOperation {
    pub index: usize,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_b: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_b: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_a_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_b_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedOperation {
    pub index: usize,
    pub action: String,
    pub operation: serde_json::Value,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub completed: Vec<CompletedOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleStatus {
    pub connected: bool,
    pub node_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub accessed: bool,
}
