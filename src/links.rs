// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-phase link validator/executor: a batch of connect/disconnect
//! operations is validated in full against one immutable topology snapshot
//! before any of it is sent to the emulator, then executed in submission
//! order. The snapshot is never updated between operations within a batch,
//! so a batch that disconnects a port and reconnects it in the same call
//! fails validation on the second op — matching what the emulator would
//! accept given the starting state.
//!
//! There is no rollback: if operation 3 of 5 fails mid-execution,
//! operations 1–2 stay applied and the response reports them as completed
//! alongside the failure. Agents that need transactional semantics should
//! submit smaller batches.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::client::Gns3Client;
use crate::error::{ErrorCode, ErrorRecord, MediatorResult};
use crate::model::{AdapterSpec, CompletedOperation, ConnectionOperation, FailedOperation, Link, Node, OperationResult};

/// Max number of port names listed in a "port not found" error before the
/// rest are collapsed into a trailing count.
const MAX_LISTED_PORTS: usize = 15;

type PortUsage = HashMap<String, HashMap<u32, HashSet<u32>>>;

/// A frozen view of one project's nodes and links, built once per batch
/// request. Never mutated; re-fetch and re-construct for the next batch.
pub struct LinkValidator {
    nodes_by_name: HashMap<String, Node>,
    nodes_by_id: HashMap<String, Node>,
    links_by_id: HashMap<String, Link>,
    links: Vec<Link>,
    port_usage: PortUsage,
}

impl LinkValidator {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let nodes_by_name: HashMap<String, Node> = nodes.iter().cloned().map(|n| (n.name.clone(), n)).collect();
        let nodes_by_id: HashMap<String, Node> = nodes.into_iter().map(|n| (n.node_id.clone(), n)).collect();
        let links_by_id: HashMap<String, Link> = links.iter().cloned().map(|l| (l.link_id.clone(), l)).collect();
        let port_usage = Self::build_port_usage(&links);

        Self {
            nodes_by_name,
            nodes_by_id,
            links_by_id,
            links,
            port_usage,
        }
    }

    fn build_port_usage(links: &[Link]) -> PortUsage {
        let mut usage: PortUsage = HashMap::new();
        for link in links {
            for endpoint in &link.nodes {
                usage
                    .entry(endpoint.node_id.clone())
                    .or_default()
                    .entry(endpoint.adapter_number)
                    .or_default()
                    .insert(endpoint.port_number);
            }
        }
        usage
    }

    fn find_link_using_port(&self, node_id: &str, adapter: u32, port: u32) -> String {
        for link in &self.links {
            for endpoint in &link.nodes {
                if endpoint.node_id == node_id && endpoint.adapter_number == adapter && endpoint.port_number == port {
                    return link.link_id.clone();
                }
            }
        }
        "unknown".to_string()
    }

    /// Resolve an [`AdapterSpec`] to a concrete adapter number for `node`.
    /// A bare number passes through unchanged; a name is looked up against
    /// the node's known ports.
    pub fn resolve_adapter(&self, node_name: &str, spec: &AdapterSpec) -> MediatorResult<(u32, Option<String>)> {
        let node = self.nodes_by_name.get(node_name).ok_or_else(|| {
            ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_name}' not found in project"))
        })?;

        match spec {
            AdapterSpec::Number(n) => Ok((*n, None)),
            AdapterSpec::Name(name) => {
                let Some(ports) = node.ports.as_deref() else {
                    return Err(ErrorRecord::new(
                        ErrorCode::InvalidAdapter,
                        format!("node '{node_name}' has no port information available"),
                    ));
                };
                if let Some(port) = ports.iter().find(|p| p.canonical_name() == Some(name.as_str())) {
                    Ok((port.adapter_number, Some(name.clone())))
                } else {
                    let mut available: Vec<&str> = ports.iter().filter_map(|p| p.canonical_name()).collect();
                    available.truncate(MAX_LISTED_PORTS);
                    let total = ports.len();
                    let mut details = available.join(", ");
                    if total > MAX_LISTED_PORTS {
                        details.push_str(&format!(" (+{} more)", total - MAX_LISTED_PORTS));
                    }
                    Err(ErrorRecord::new(
                        ErrorCode::InvalidAdapter,
                        format!("node '{node_name}' has no port named '{name}'"),
                    )
                    .with_details(details))
                }
            }
        }
    }

    /// Immutable snapshot of the current port-usage map, held fixed for the
    /// whole of a batch's phase-1 validation (see `execute_batch`).
    pub fn port_usage_snapshot(&self) -> PortUsage {
        self.port_usage.clone()
    }

    pub fn validate_connect(
        &self,
        usage: &PortUsage,
        node_a: &str,
        node_b: &str,
        port_a: u32,
        port_b: u32,
        adapter_a: u32,
        adapter_b: u32,
    ) -> MediatorResult<()> {
        let a = self
            .nodes_by_name
            .get(node_a)
            .ok_or_else(|| ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_a}' not found in project")))?;
        let b = self
            .nodes_by_name
            .get(node_b)
            .ok_or_else(|| ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_b}' not found in project")))?;

        self.check_port_available(usage, &a.node_id, node_a, adapter_a, port_a)?;
        self.check_port_available(usage, &b.node_id, node_b, adapter_b, port_b)?;
        self.validate_port_exists(a, node_a, adapter_a, port_a)?;
        self.validate_port_exists(b, node_b, adapter_b, port_b)?;
        Ok(())
    }

    fn check_port_available(&self, usage: &PortUsage, node_id: &str, node_name: &str, adapter: u32, port: u32) -> MediatorResult<()> {
        if usage
            .get(node_id)
            .and_then(|by_adapter| by_adapter.get(&adapter))
            .is_some_and(|ports| ports.contains(&port))
        {
            let link_id = self.find_link_using_port(node_id, adapter, port);
            return Err(ErrorRecord::new(
                ErrorCode::PortInUse,
                format!("port {node_name} adapter {adapter} port {port} is already connected (link: {link_id})"),
            )
            .with_suggested_action(format!(
                "disconnect first with set_connection([{{\"action\": \"disconnect\", \"link_id\": \"{link_id}\"}}])"
            )));
        }
        Ok(())
    }

    /// Nodes without port metadata (Cloud, NAT, ...) can't be validated and
    /// are let through per the original behavior.
    fn validate_port_exists(&self, node: &Node, node_name: &str, adapter: u32, port: u32) -> MediatorResult<()> {
        let Some(ports) = &node.ports else {
            return Ok(());
        };
        if ports.is_empty() {
            return Ok(());
        }
        let found = ports.iter().any(|p| p.adapter_number == adapter && p.port_number == port);
        if found {
            return Ok(());
        }

        let mut by_adapter: HashMap<u32, Vec<u32>> = HashMap::new();
        for p in ports {
            by_adapter.entry(p.adapter_number).or_default().push(p.port_number);
        }
        let mut adapters: Vec<u32> = by_adapter.keys().copied().collect();
        adapters.sort_unstable();
        let summary: Vec<String> = adapters
            .into_iter()
            .map(|a| {
                let mut ps = by_adapter[&a].clone();
                ps.sort_unstable();
                format!("adapter {a}: ports {ps:?}")
            })
            .collect();

        Err(ErrorRecord::new(
            ErrorCode::InvalidPort,
            format!("node {node_name} has no port at adapter {adapter} port {port}"),
        )
        .with_details(format!("available: {}", summary.join(", "))))
    }

    pub fn validate_disconnect(&self, link_id: &str) -> MediatorResult<()> {
        if self.links_by_id.contains_key(link_id) {
            Ok(())
        } else {
            Err(ErrorRecord::new(ErrorCode::LinkNotFound, format!("link '{link_id}' not found in project")))
        }
    }

    /// Canonical name of the port actually occupying (adapter, port) on
    /// `node_name`, if the node publishes port metadata and one matches.
    pub fn port_name_for(&self, node_name: &str, adapter: u32, port: u32) -> Option<String> {
        let node = self.nodes_by_name.get(node_name)?;
        let ports = node.ports.as_deref()?;
        ports
            .iter()
            .find(|p| p.adapter_number == adapter && p.port_number == port)
            .and_then(|p| p.canonical_name())
            .map(str::to_string)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes_by_name.get(name)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes_by_id.get(id)
    }
}

/// Resolved form of a [`ConnectionOperation`], ready for phase 2 once every
/// operation in the batch has passed phase 1.
enum Resolved {
    Connect {
        node_a: String,
        node_b: String,
        node_id_a: String,
        node_id_b: String,
        port_a: u32,
        port_b: u32,
        adapter_a_num: u32,
        adapter_b_num: u32,
        port_a_name: Option<String>,
        port_b_name: Option<String>,
    },
    Disconnect {
        link_id: String,
    },
}

/// Validate every operation in `ops` against `validator`, then execute them
/// one at a time against the live emulator. Stops at the first execution
/// failure; operations before it stay applied (see module docs).
pub async fn execute_batch(
    client: &Gns3Client,
    project_id: &str,
    validator: &LinkValidator,
    ops: Vec<ConnectionOperation>,
) -> MediatorResult<OperationResult> {
    let mut resolved = Vec::with_capacity(ops.len());

    // Phase 1: validate everything up front, no network calls, against one
    // immutable snapshot of the starting topology. The snapshot is not
    // updated between operations within the batch (spec.md §4.C and the
    // original `LinkValidator`, whose `port_usage` map is built once and
    // never mutated while validating a batch): a batch that disconnects a
    // link and reconnects the same ports in one call fails validation on
    // the second op, same as the emulator would reject it given the
    // starting state.
    let usage = validator.port_usage_snapshot();
    for (idx, op) in ops.iter().enumerate() {
        match op {
            ConnectionOperation::Connect {
                node_a,
                node_b,
                port_a,
                port_b,
                adapter_a,
                adapter_b,
            } => {
                let (adapter_a_num, _) = validator.resolve_adapter(node_a, adapter_a).map_err(|e| {
                    e.with_context("operation_index", idx as u64)
                })?;
                let (adapter_b_num, _) = validator.resolve_adapter(node_b, adapter_b).map_err(|e| {
                    e.with_context("operation_index", idx as u64)
                })?;
                validator
                    .validate_connect(&usage, node_a, node_b, *port_a, *port_b, adapter_a_num, adapter_b_num)
                    .map_err(|e| e.with_context("operation_index", idx as u64))?;

                let a_id = validator.node_by_name(node_a).map(|n| n.node_id.clone()).unwrap_or_default();
                let b_id = validator.node_by_name(node_b).map(|n| n.node_id.clone()).unwrap_or_default();
                let port_a_name = validator.port_name_for(node_a, adapter_a_num, *port_a);
                let port_b_name = validator.port_name_for(node_b, adapter_b_num, *port_b);

                resolved.push(Resolved::Connect {
                    node_a: node_a.clone(),
                    node_b: node_b.clone(),
                    node_id_a: a_id,
                    node_id_b: b_id,
                    port_a: *port_a,
                    port_b: *port_b,
                    adapter_a_num,
                    adapter_b_num,
                    port_a_name,
                    port_b_name,
                });
            }
            ConnectionOperation::Disconnect { link_id } => {
                validator
                    .validate_disconnect(link_id)
                    .map_err(|e| e.with_context("operation_index", idx as u64))?;

                resolved.push(Resolved::Disconnect { link_id: link_id.clone() });
            }
        }
    }

    tracing::info!(count = resolved.len(), "all link operations validated, executing");

    // Phase 2: execute in order, no rollback on failure.
    let mut completed = Vec::with_capacity(resolved.len());
    for (idx, op) in resolved.into_iter().enumerate() {
        match op {
            Resolved::Connect {
                node_a,
                node_b,
                node_id_a,
                node_id_b,
                port_a,
                port_b,
                adapter_a_num,
                adapter_b_num,
                port_a_name,
                port_b_name,
            } => {
                let spec = json!({
                    "nodes": [
                        { "node_id": node_id_a, "adapter_number": adapter_a_num, "port_number": port_a },
                        { "node_id": node_id_b, "adapter_number": adapter_b_num, "port_number": port_b },
                    ]
                });

                match client.create_link(project_id, &spec).await {
                    Ok(value) => {
                        let link_id = value.get("link_id").and_then(|v| v.as_str()).map(str::to_string);
                        completed.push(CompletedOperation {
                            index: idx,
                            action: "connect".to_string(),
                            link_id,
                            node_a: Some(node_a),
                            node_b: Some(node_b),
                            port_a: Some(port_a),
                            port_b: Some(port_b),
                            adapter_a: Some(adapter_a_num),
                            adapter_b: Some(adapter_b_num),
                            port_a_name,
                            port_b_name,
                        });
                    }
                    Err(err) => {
                        return Ok(OperationResult {
                            completed,
                            failed: Some(FailedOperation {
                                index: idx,
                                action: "connect".to_string(),
                                operation: json!({ "node_a": node_a, "node_b": node_b }),
                                reason: err.to_string(),
                            }),
                        });
                    }
                }
            }
            Resolved::Disconnect { link_id } => match client.delete_link(project_id, &link_id).await {
                Ok(()) => completed.push(CompletedOperation {
                    index: idx,
                    action: "disconnect".to_string(),
                    link_id: Some(link_id),
                    node_a: None,
                    node_b: None,
                    port_a: None,
                    port_b: None,
                    adapter_a: None,
                    adapter_b: None,
                    port_a_name: None,
                    port_b_name: None,
                }),
                Err(err) => {
                    return Ok(OperationResult {
                        completed,
                        failed: Some(FailedOperation {
                            index: idx,
                            action: "disconnect".to_string(),
                            operation: json!({ "link_id": link_id }),
                            reason: err.to_string(),
                        }),
                    });
                }
            },
        }
    }

    Ok(OperationResult { completed, failed: None })
}

#[cfg(test)]
#[path = "links_tests.rs"]
mod tests;
