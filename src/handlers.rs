// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool handlers: one function per agent-visible operation. [`dispatch`]
//! is the single seam every transport calls through; it never lets a raw
//! error escape, converting every [`ErrorRecord`] into its JSON envelope
//! before returning.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::{ErrorCode, ErrorRecord, MediatorResult};
use crate::links::{execute_batch, LinkValidator};
use crate::model::{ConnectionOperation, Node};
use crate::prompts;
use crate::resources;

/// Poll interval for `send_and_wait_console`.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// How long `set_node`'s `restart` action waits between stop-confirmation
/// polls, and how many attempts it makes (3 attempts, 5s apart).
const RESTART_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RESTART_POLL_ATTEMPTS: usize = 3;
/// `configure_node_network`'s restart uses a tighter poll to match its
/// file-write-then-reboot workflow.
const NETWORK_RESTART_POLL_INTERVAL: Duration = Duration::from_secs(1);
const NETWORK_RESTART_POLL_ATTEMPTS: usize = 10;

/// Route one `{tool_name, arguments}` call to its handler and render the
/// result (success JSON or [`ErrorRecord`]) as the JSON document the
/// transport writes back to the agent.
pub async fn dispatch(app: &AppContext, tool_name: &str, arguments: Value) -> Value {
    let result = run(app, tool_name, arguments).await;
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(tool_name, error_code = %err.error_code, "tool call failed");
            err.to_json()
        }
    }
}

async fn run(app: &AppContext, tool_name: &str, args: Value) -> MediatorResult<Value> {
    match tool_name {
        "list_projects" => list_projects(app).await,
        "open_project" => open_project(app, &args).await,
        "create_project" => create_project(app, &args).await,
        "close_project" => close_project(app, &args).await,
        "list_nodes" => list_nodes(app).await,
        "get_node_details" => get_node_details(app, &args).await,
        "set_node" => set_node(app, &args).await,
        "create_node" => create_node(app, &args).await,
        "delete_node" => delete_node(app, &args).await,
        "configure_node_network" => configure_node_network(app, &args).await,
        "get_node_file" => get_node_file(app, &args).await,
        "write_node_file" => write_node_file(app, &args).await,
        "get_links" => get_links(app).await,
        "set_connection" => set_connection(app, &args).await,
        "list_drawings" => list_drawings(app).await,
        "create_drawing" => create_drawing(app, &args).await,
        "update_drawing" => update_drawing(app, &args).await,
        "delete_drawing" => delete_drawing(app, &args).await,
        "send_console" => send_console(app, &args).await,
        "read_console" => read_console(app, &args).await,
        "send_and_wait_console" => send_and_wait_console(app, &args).await,
        "send_keystroke" => send_keystroke(app, &args).await,
        "disconnect_console" => disconnect_console(app, &args).await,
        "get_console_status" => get_console_status(app, &args).await,
        "query_resource" => query_resource(app, &args).await,
        "get_workflow_prompt" => get_workflow_prompt(&args).await,
        "configure_ssh" => configure_ssh(app, &args).await,
        "ssh_send_command" => ssh_send_command(app, &args).await,
        "ssh_send_tftp" => ssh_send_tftp(app, &args).await,
        "ssh_send_http_client" => ssh_send_http_client(app, &args).await,
        other => Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("unknown tool '{other}'"))
            .with_suggested_action("call query_resource(\"projects://\") or consult the tool catalogue for valid names")),
    }
}

// --- argument extraction helpers ---

fn require_str<'a>(args: &'a Value, key: &str) -> MediatorResult<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ErrorRecord::new(ErrorCode::MissingParameter, format!("missing required parameter '{key}'"))
                .with_context("parameter", key)
        })
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn opt_u32(args: &Value, key: &str) -> Option<u32> {
    args.get(key).and_then(Value::as_u64).map(|v| v as u32)
}

fn opt_i32(args: &Value, key: &str) -> Option<i32> {
    args.get(key).and_then(Value::as_i64).map(|v| v as i32)
}

fn opt_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

/// Ensures a current project is opened, auto-detecting a singly-opened
/// project if none is recorded yet.
async fn require_project(app: &AppContext) -> MediatorResult<String> {
    if let Some(id) = app.current_project_id().await {
        return Ok(id);
    }

    let projects = app.gns3.get_projects().await?;
    let opened: Vec<&Value> = projects
        .iter()
        .filter(|p| p.get("status").and_then(Value::as_str) == Some("opened"))
        .collect();

    match opened.as_slice() {
        [single] => {
            let id = single
                .get("project_id")
                .and_then(Value::as_str)
                .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, "opened project missing project_id"))?
                .to_string();
            app.set_current_project_id(Some(id.clone())).await;
            Ok(id)
        }
        _ => Err(ErrorRecord::new(ErrorCode::ProjectNotFound, "no project is currently opened")
            .with_suggested_action("call open_project() or list_projects() to pick one")),
    }
}

async fn find_node(app: &AppContext, project_id: &str, node_name: &str) -> MediatorResult<Value> {
    let nodes = app.gns3.get_nodes(project_id).await?;
    nodes
        .iter()
        .find(|n| n.get("name").and_then(Value::as_str) == Some(node_name))
        .cloned()
        .ok_or_else(|| {
            let available: Vec<&str> = nodes.iter().filter_map(|n| n.get("name").and_then(Value::as_str)).collect();
            ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_name}' not found"))
                .with_suggested_action("call list_nodes() to see available nodes (case-sensitive)")
                .with_context("available_nodes", json!(available))
        })
}

// --- project handlers ---

async fn list_projects(app: &AppContext) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_projects().await?))
}

async fn open_project(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_name = require_str(args, "project_name")?;
    let projects = app.gns3.get_projects().await?;
    let project = projects
        .into_iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(project_name))
        .ok_or_else(|| {
            ErrorRecord::new(ErrorCode::ProjectNotFound, format!("no project named '{project_name}' found"))
                .with_suggested_action("call list_projects() to see exact project names (case-sensitive)")
        })?;

    let project_id = project
        .get("project_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, "project missing project_id"))?
        .to_string();

    let result = app.gns3.open_project(&project_id).await?;
    app.set_current_project_id(Some(project_id)).await;
    Ok(result)
}

async fn create_project(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let name = require_str(args, "name")?;
    let path = opt_str(args, "path");
    let result = app.gns3.create_project(name, path).await?;
    if let Some(id) = result.get("project_id").and_then(Value::as_str) {
        app.set_current_project_id(Some(id.to_string())).await;
    }
    Ok(result)
}

async fn close_project(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = match opt_str(args, "project_id") {
        Some(id) => id.to_string(),
        None => require_project(app).await?,
    };
    let result = app.gns3.close_project(&project_id).await?;
    if app.current_project_id().await.as_deref() == Some(project_id.as_str()) {
        app.set_current_project_id(None).await;
    }
    Ok(result)
}

// --- node handlers ---

async fn list_nodes(app: &AppContext) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let nodes = app.gns3.get_nodes(&project_id).await?;
    let summaries: Vec<Value> = nodes
        .iter()
        .map(|n| {
            json!({
                "node_id": n.get("node_id"),
                "name": n.get("name"),
                "node_type": n.get("node_type"),
                "status": n.get("status"),
                "console_type": n.get("console_type"),
                "console": n.get("console"),
            })
        })
        .collect();
    Ok(json!(summaries))
}

async fn get_node_details(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    find_node(app, &project_id, node_name).await
}

#[derive(Debug, Default)]
struct NodeUpdatePlan {
    top_level: serde_json::Map<String, Value>,
    hardware: serde_json::Map<String, Value>,
    changes: Vec<String>,
    warnings: Vec<String>,
}

fn node_type_of(node: &Value) -> &str {
    node.get("node_type").and_then(Value::as_str).unwrap_or("")
}

fn node_status_of(node: &Value) -> &str {
    node.get("status").and_then(Value::as_str).unwrap_or("unknown")
}

/// Builds the property-update half of `set_node`, mirroring the original's
/// split between top-level node fields and QEMU's nested `properties` bag.
fn plan_node_update(node: &Value, args: &Value) -> MediatorResult<NodeUpdatePlan> {
    let mut plan = NodeUpdatePlan::default();

    if let Some(name) = opt_str(args, "name") {
        if node_status_of(node) != "stopped" {
            return Err(ErrorRecord::new(ErrorCode::NodeRunning, "renaming a node requires it to be stopped")
                .with_suggested_action("stop the node first with set_node(action=\"stop\")"));
        }
        plan.top_level.insert("name".to_string(), json!(name));
        plan.changes.push(format!("name={name}"));
    }

    let mut pos = Vec::new();
    if let Some(x) = opt_i32(args, "x") {
        plan.top_level.insert("x".to_string(), json!(x));
        pos.push(format!("x={x}"));
    }
    if let Some(y) = opt_i32(args, "y") {
        plan.top_level.insert("y".to_string(), json!(y));
        pos.push(format!("y={y}"));
    }
    if let Some(z) = opt_i32(args, "z") {
        plan.top_level.insert("z".to_string(), json!(z));
        pos.push(format!("z={z}"));
    }
    if !pos.is_empty() {
        plan.changes.push(pos.join(", "));
    }

    if let Some(locked) = opt_bool(args, "locked") {
        plan.top_level.insert("locked".to_string(), json!(locked));
        plan.changes.push(format!("locked={locked}"));
    }

    if let Some(console_type) = opt_str(args, "console_type") {
        plan.hardware.insert("console_type".to_string(), json!(console_type));
        plan.changes.push(format!("console_type={console_type}"));
    }
    if let Some(ram) = opt_u32(args, "ram") {
        plan.hardware.insert("ram".to_string(), json!(ram));
        plan.changes.push(format!("ram={ram}"));
    }
    if let Some(cpus) = opt_u32(args, "cpus") {
        plan.hardware.insert("cpus".to_string(), json!(cpus));
        plan.changes.push(format!("cpus={cpus}"));
    }
    if let Some(adapters) = opt_u32(args, "adapters") {
        plan.hardware.insert("adapters".to_string(), json!(adapters));
        plan.changes.push(format!("adapters={adapters}"));
    }
    if let Some(hdd) = opt_str(args, "hdd_disk_image") {
        plan.hardware.insert("hdd_disk_image".to_string(), json!(hdd));
        plan.changes.push(format!("hdd_disk_image={hdd}"));
    }

    if let Some(ports) = opt_u32(args, "ports") {
        if node_type_of(node) == "ethernet_switch" {
            let mapping: Vec<Value> = (0..ports)
                .map(|i| json!({ "name": format!("Ethernet{i}"), "port_number": i, "type": "access", "vlan": 1 }))
                .collect();
            plan.hardware.insert("ports_mapping".to_string(), json!(mapping));
            plan.changes.push(format!("ports={ports}"));
        } else {
            plan.warnings.push("port configuration only supported for ethernet switches".to_string());
        }
    }

    Ok(plan)
}

async fn set_node(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    let node = find_node(app, &project_id, node_name).await?;
    let node_id = node
        .get("node_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, "node missing node_id"))?
        .to_string();

    let plan = plan_node_update(&node, args)?;
    let mut changes = plan.changes;
    let mut warnings = plan.warnings;

    let mut payload = plan.top_level;
    if !plan.hardware.is_empty() {
        if node_type_of(&node) == "qemu" {
            payload.insert("properties".to_string(), Value::Object(plan.hardware));
        } else {
            payload.extend(plan.hardware);
        }
    }

    if !payload.is_empty() {
        app.gns3.update_node(&project_id, &node_id, &Value::Object(payload)).await?;
    }

    if let Some(action) = opt_str(args, "action") {
        run_node_action(app, &project_id, &node_id, node_name, action, &mut changes, &mut warnings).await?;
    }

    if changes.is_empty() {
        return Ok(json!({ "message": format!("no changes made to {node_name}") }));
    }

    Ok(json!({
        "message": "node updated successfully",
        "changes": changes,
        "warnings": warnings,
    }))
}

async fn run_node_action(
    app: &AppContext,
    project_id: &str,
    node_id: &str,
    node_name: &str,
    action: &str,
    changes: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> MediatorResult<()> {
    match action.to_lowercase().as_str() {
        "start" => {
            app.gns3.start_node(project_id, node_id).await?;
            changes.push(format!("started {node_name}"));
        }
        "stop" => {
            app.gns3.stop_node(project_id, node_id).await?;
            changes.push(format!("stopped {node_name}"));
        }
        "suspend" => {
            app.gns3.suspend_node(project_id, node_id).await?;
            changes.push(format!("suspended {node_name}"));
        }
        "reload" => {
            app.gns3.reload_node(project_id, node_id).await?;
            changes.push(format!("reloaded {node_name}"));
        }
        "restart" => {
            app.gns3.stop_node(project_id, node_id).await?;
            changes.push(format!("stopped {node_name}"));

            let mut stopped = false;
            for attempt in 1..=RESTART_POLL_ATTEMPTS {
                tokio::time::sleep(RESTART_POLL_INTERVAL).await;
                let nodes = app.gns3.get_nodes(project_id).await?;
                if let Some(current) = nodes.iter().find(|n| n.get("node_id").and_then(Value::as_str) == Some(node_id)) {
                    if current.get("status").and_then(Value::as_str) == Some("stopped") {
                        stopped = true;
                        break;
                    }
                }
                changes.push(format!("retry {attempt}/{RESTART_POLL_ATTEMPTS}: waiting for stop"));
            }
            if !stopped {
                warnings.push("node may not have stopped completely before restart".to_string());
            }

            app.gns3.start_node(project_id, node_id).await?;
            changes.push(format!("started {node_name}"));
        }
        other => {
            return Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("invalid action '{other}'"))
                .with_context("valid_actions", json!(["start", "stop", "suspend", "reload", "restart"])));
        }
    }
    Ok(())
}

async fn create_node(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let template_name = require_str(args, "template_name")?;
    let x = args.get("x").and_then(Value::as_i64).unwrap_or(0);
    let y = args.get("y").and_then(Value::as_i64).unwrap_or(0);
    let compute_id = opt_str(args, "compute_id").unwrap_or("local");

    let templates = app.gns3.get_templates().await?;
    let template = templates
        .iter()
        .find(|t| t.get("name").and_then(Value::as_str) == Some(template_name))
        .cloned()
        .ok_or_else(|| {
            let available: Vec<&str> = templates.iter().filter_map(|t| t.get("name").and_then(Value::as_str)).collect();
            ErrorRecord::new(ErrorCode::TemplateNotFound, format!("template '{template_name}' not found"))
                .with_suggested_action("call query_resource(\"templates://\") to see available templates")
                .with_context("available_templates", json!(available))
        })?;

    let template_id = template
        .get("template_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, "template missing template_id"))?;

    let mut payload = json!({ "x": x, "y": y, "compute_id": compute_id });
    if let Some(name) = opt_str(args, "node_name") {
        payload["name"] = json!(name);
    }
    if let Some(properties) = args.get("properties") {
        payload["properties"] = properties.clone();
    }

    let result = app.gns3.create_node_from_template(&project_id, template_id, &payload).await?;
    Ok(json!({ "message": "node created successfully", "node": result }))
}

async fn delete_node(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    let node = find_node(app, &project_id, node_name).await?;
    let node_id = node.get("node_id").and_then(Value::as_str).unwrap_or_default();
    app.gns3.delete_node(&project_id, node_id).await?;
    Ok(json!({ "message": format!("node '{node_name}' deleted successfully") }))
}

fn require_docker(node: &Value, node_name: &str) -> MediatorResult<()> {
    if node_type_of(node) != "docker" {
        return Err(ErrorRecord::new(
            ErrorCode::InvalidNodeState,
            "this operation is only supported for docker nodes",
        )
        .with_details(format!("node '{node_name}' is type '{}'", node_type_of(node))));
    }
    Ok(())
}

async fn get_node_file(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    let file_path = require_str(args, "file_path")?;
    let node = find_node(app, &project_id, node_name).await?;
    require_docker(&node, node_name)?;

    let node_id = node.get("node_id").and_then(Value::as_str).unwrap_or_default();
    let content = app.gns3.get_node_file(&project_id, node_id, file_path).await?;
    Ok(json!({ "node_name": node_name, "file_path": file_path, "content": content }))
}

async fn write_node_file(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    let file_path = require_str(args, "file_path")?;
    let content = require_str(args, "content")?;
    let node = find_node(app, &project_id, node_name).await?;
    require_docker(&node, node_name)?;

    let node_id = node.get("node_id").and_then(Value::as_str).unwrap_or_default();
    app.gns3.write_node_file(&project_id, node_id, file_path, content).await?;
    Ok(json!({
        "message": format!("file '{file_path}' written successfully to node '{node_name}'"),
        "node_name": node_name,
        "file_path": file_path,
        "note": "node restart may be required for changes to take effect",
    }))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
enum NetworkInterfaceConfig {
    Static {
        name: String,
        address: String,
        netmask: String,
        #[serde(default)]
        gateway: Option<String>,
        #[serde(default)]
        dns: Option<String>,
    },
    Dhcp { name: String },
}

/// Renders a Debian-style `/etc/network/interfaces` file, the format GNS3's
/// Docker nodes expect.
fn render_debian_interfaces(interfaces: &[NetworkInterfaceConfig]) -> String {
    let mut out = String::from("auto lo\niface lo inet loopback\n\n");
    for iface in interfaces {
        match iface {
            NetworkInterfaceConfig::Dhcp { name } => {
                out.push_str(&format!("auto {name}\niface {name} inet dhcp\n\n"));
            }
            NetworkInterfaceConfig::Static { name, address, netmask, gateway, dns } => {
                out.push_str(&format!("auto {name}\niface {name} inet static\n"));
                out.push_str(&format!("    address {address}\n"));
                out.push_str(&format!("    netmask {netmask}\n"));
                if let Some(gw) = gateway {
                    out.push_str(&format!("    gateway {gw}\n"));
                }
                out.push_str(&format!("    dns-nameservers {}\n", dns.as_deref().unwrap_or("8.8.8.8")));
                out.push('\n');
            }
        }
    }
    out
}

async fn configure_node_network(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let node_name = require_str(args, "node_name")?;
    let interfaces_arg = args.get("interfaces").cloned().unwrap_or(Value::Array(Vec::new()));
    let interfaces: Vec<NetworkInterfaceConfig> = serde_json::from_value(interfaces_arg).map_err(|e| {
        ErrorRecord::new(ErrorCode::InvalidParameter, "could not parse 'interfaces'").with_details(e.to_string())
    })?;

    let node = find_node(app, &project_id, node_name).await?;
    require_docker(&node, node_name)?;
    let node_id = node
        .get("node_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, "node missing node_id"))?
        .to_string();

    let content = render_debian_interfaces(&interfaces);
    app.gns3.write_node_file(&project_id, &node_id, "etc/network/interfaces", &content).await?;

    app.gns3.stop_node(&project_id, &node_id).await?;
    for _ in 0..NETWORK_RESTART_POLL_ATTEMPTS {
        tokio::time::sleep(NETWORK_RESTART_POLL_INTERVAL).await;
        let nodes = app.gns3.get_nodes(&project_id).await?;
        if nodes
            .iter()
            .find(|n| n.get("node_id").and_then(Value::as_str) == Some(node_id.as_str()))
            .and_then(|n| n.get("status").and_then(Value::as_str))
            == Some("stopped")
        {
            break;
        }
    }
    app.gns3.start_node(&project_id, &node_id).await?;

    Ok(json!({
        "message": format!("network configuration applied to node '{node_name}'"),
        "node_name": node_name,
        "status": "node restarted to apply configuration",
        "note": "allow 10-15 seconds for the node to complete startup and network configuration",
    }))
}

// --- link handlers ---

async fn get_links(app: &AppContext) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    Ok(json!(app.gns3.get_links(&project_id).await?))
}

async fn set_connection(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let operations_arg = args
        .get("operations")
        .cloned()
        .ok_or_else(|| ErrorRecord::new(ErrorCode::MissingParameter, "missing required parameter 'operations'"))?;
    let ops: Vec<ConnectionOperation> = serde_json::from_value(operations_arg).map_err(|e| {
        ErrorRecord::new(ErrorCode::InvalidParameter, "could not parse 'operations'").with_details(e.to_string())
    })?;

    let raw_nodes = app.gns3.get_nodes(&project_id).await?;
    let raw_links = app.gns3.get_links(&project_id).await?;
    let nodes: Vec<Node> = raw_nodes
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ErrorRecord::new(ErrorCode::Gns3ApiError, "malformed node data").with_details(e.to_string()))?;
    let links: Vec<crate::model::Link> = raw_links
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ErrorRecord::new(ErrorCode::Gns3ApiError, "malformed link data").with_details(e.to_string()))?;

    let validator = LinkValidator::new(nodes, links);
    let result = execute_batch(&app.gns3, &project_id, &validator, ops).await?;
    Ok(json!(result))
}

// --- drawing handlers ---

async fn list_drawings(app: &AppContext) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    Ok(json!(app.gns3.get_drawings(&project_id).await?))
}

fn rectangle_svg(width: i64, height: i64, fill: &str, border: &str, border_width: i64) -> String {
    format!(
        "<svg width=\"{width}\" height=\"{height}\"><rect width=\"{width}\" height=\"{height}\" \
         fill=\"{fill}\" stroke=\"{border}\" stroke-width=\"{border_width}\"/></svg>"
    )
}

fn ellipse_svg(rx: i64, ry: i64, fill: &str, border: &str, border_width: i64) -> String {
    format!(
        "<svg width=\"{w}\" height=\"{h}\"><ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\" \
         fill=\"{fill}\" stroke=\"{border}\" stroke-width=\"{border_width}\"/></svg>",
        w = rx * 2,
        h = ry * 2,
    )
}

fn line_svg(x2: i64, y2: i64, color: &str, width: i64) -> String {
    format!(
        "<svg width=\"{w}\" height=\"{h}\"><line x1=\"0\" y1=\"0\" x2=\"{x2}\" y2=\"{y2}\" \
         stroke=\"{color}\" stroke-width=\"{width}\"/></svg>",
        w = x2.abs().max(1),
        h = y2.abs().max(1),
    )
}

fn text_svg(text: &str, font_size: i64, font_weight: &str, font_family: &str, color: &str) -> String {
    let escaped = text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
    format!(
        "<svg><text font-family=\"{font_family}\" font-size=\"{font_size}\" font-weight=\"{font_weight}\" \
         fill=\"{color}\">{escaped}</text></svg>"
    )
}

async fn create_drawing(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let drawing_type = require_str(args, "drawing_type")?.to_lowercase();
    let x = args.get("x").and_then(Value::as_i64).unwrap_or(0);
    let y = args.get("y").and_then(Value::as_i64).unwrap_or(0);
    let z = args.get("z").and_then(Value::as_i64).unwrap_or(0);
    let border_width = args.get("border_width").and_then(Value::as_i64).unwrap_or(2);

    let (svg, message) = match drawing_type.as_str() {
        "rectangle" => {
            let width = args.get("width").and_then(Value::as_i64).ok_or_else(|| {
                ErrorRecord::new(ErrorCode::MissingParameter, "rectangle requires 'width' and 'height'")
            })?;
            let height = args.get("height").and_then(Value::as_i64).ok_or_else(|| {
                ErrorRecord::new(ErrorCode::MissingParameter, "rectangle requires 'width' and 'height'")
            })?;
            let fill = opt_str(args, "fill_color").unwrap_or("#ffffff");
            let border = opt_str(args, "border_color").unwrap_or("#000000");
            (rectangle_svg(width, height, fill, border, border_width), "rectangle created successfully")
        }
        "ellipse" => {
            let rx = args
                .get("rx")
                .and_then(Value::as_i64)
                .ok_or_else(|| ErrorRecord::new(ErrorCode::MissingParameter, "ellipse requires 'rx' and 'ry'"))?;
            let ry = args
                .get("ry")
                .and_then(Value::as_i64)
                .ok_or_else(|| ErrorRecord::new(ErrorCode::MissingParameter, "ellipse requires 'rx' and 'ry'"))?;
            let fill = opt_str(args, "fill_color").unwrap_or("#ffffff");
            let border = opt_str(args, "border_color").unwrap_or("#000000");
            (ellipse_svg(rx, ry, fill, border, border_width), "ellipse created successfully")
        }
        "line" => {
            let x2 = args
                .get("x2")
                .and_then(Value::as_i64)
                .ok_or_else(|| ErrorRecord::new(ErrorCode::MissingParameter, "line requires 'x2' and 'y2'"))?;
            let y2 = args
                .get("y2")
                .and_then(Value::as_i64)
                .ok_or_else(|| ErrorRecord::new(ErrorCode::MissingParameter, "line requires 'x2' and 'y2'"))?;
            let color = opt_str(args, "color").unwrap_or("#000000");
            (line_svg(x2, y2, color, border_width), "line created successfully")
        }
        "text" => {
            let text = require_str(args, "text")?;
            let font_size = args.get("font_size").and_then(Value::as_i64).unwrap_or(10);
            let font_weight = opt_str(args, "font_weight").unwrap_or("normal");
            let font_family = opt_str(args, "font_family").unwrap_or("TypeWriter");
            let color = opt_str(args, "color").unwrap_or("#000000");
            (text_svg(text, font_size, font_weight, font_family, color), "text created successfully")
        }
        other => {
            return Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("invalid drawing type '{other}'"))
                .with_context("valid_values", json!(["rectangle", "ellipse", "line", "text"])));
        }
    };

    let drawing_data = json!({ "x": x, "y": y, "z": z, "svg": svg, "rotation": 0 });
    let result = app.gns3.create_drawing(&project_id, &drawing_data).await?;
    Ok(json!({ "message": message, "drawing": result }))
}

async fn update_drawing(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let drawing_id = require_str(args, "drawing_id")?;

    let mut payload = serde_json::Map::new();
    for key in ["x", "y", "z", "rotation"] {
        if let Some(v) = args.get(key).and_then(Value::as_i64) {
            payload.insert(key.to_string(), json!(v));
        }
    }
    if let Some(svg) = opt_str(args, "svg") {
        payload.insert("svg".to_string(), json!(svg));
    }
    if let Some(locked) = opt_bool(args, "locked") {
        payload.insert("locked".to_string(), json!(locked));
    }

    app.gns3.update_drawing(&project_id, drawing_id, &Value::Object(payload)).await
}

async fn delete_drawing(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let project_id = require_project(app).await?;
    let drawing_id = require_str(args, "drawing_id")?;
    app.gns3.delete_drawing(&project_id, drawing_id).await?;
    Ok(json!({ "message": format!("drawing '{drawing_id}' deleted successfully") }))
}

// --- console handlers ---

/// Interprets the closed set of backslash escapes the agent may send, then
/// folds every line ending to `CRLF`. The fold is CRLF→LF→CRLF so text
/// already using `CRLF` round-trips unchanged instead of being doubled.
fn normalize_console_text(data: &str, raw: bool) -> String {
    if raw {
        return data.to_string();
    }
    let unescaped = data
        .replace("\\r\\n", "\r\n")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\x1b", "\x1b");

    unescaped.replace("\r\n", "\n").replace('\r', "\n").replace('\n', "\r\n")
}

fn gns3_host(app: &AppContext) -> String {
    app.gns3
        .base_url
        .split("//")
        .nth(1)
        .and_then(|rest| rest.split(':').next())
        .unwrap_or("localhost")
        .to_string()
}

/// Connect to a node's console if not already connected, resolving its
/// telnet endpoint from the node's current state.
async fn auto_connect_console(app: &AppContext, node_name: &str) -> MediatorResult<()> {
    if app.console.has_session(node_name).await {
        return Ok(());
    }

    let project_id = require_project(app).await?;
    let node = find_node(app, &project_id, node_name).await?;

    let console_type = node.get("console_type").and_then(Value::as_str).unwrap_or_default();
    if console_type != "telnet" {
        return Err(ErrorRecord::new(
            ErrorCode::InvalidNodeState,
            format!("console type '{console_type}' not supported (only 'telnet')"),
        ));
    }

    let port = node.get("console").and_then(Value::as_u64).ok_or_else(|| {
        ErrorRecord::new(ErrorCode::ConsoleConnectionFailed, format!("node '{node_name}' has no console configured"))
            .with_suggested_action("verify the node is started")
    })? as u16;

    let host = node
        .get("console_host")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| gns3_host(app));

    app.console.connect(&host, port, node_name).await?;
    Ok(())
}

async fn send_console(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let data = require_str(args, "data")?;
    let raw = opt_bool(args, "raw").unwrap_or(false);

    auto_connect_console(app, node_name).await?;
    let payload = normalize_console_text(data, raw);
    if !app.console.send_by_node(node_name, &payload).await {
        return Err(ErrorRecord::new(ErrorCode::ConsoleDisconnected, "failed to send data to console"));
    }
    Ok(json!("sent successfully"))
}

struct GrepOptions {
    case_insensitive: bool,
    invert: bool,
    before: usize,
    after: usize,
}

/// Grep-style filter over already-fetched console output: matches a regex
/// per line, keeps requested context, and prefixes surviving lines with
/// their 1-indexed line number.
fn grep_filter(text: &str, pattern: &str, opts: GrepOptions) -> MediatorResult<String> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let regex = if opts.case_insensitive {
        Regex::new(&format!("(?i){pattern}"))
    } else {
        Regex::new(pattern)
    }
    .map_err(|e| ErrorRecord::new(ErrorCode::InvalidParameter, "invalid regex pattern").with_details(e.to_string()))?;

    let lines: Vec<&str> = text.lines().collect();
    let mut matching = std::collections::BTreeSet::new();
    for (i, line) in lines.iter().enumerate() {
        let is_match = regex.is_match(line) != opts.invert;
        if is_match {
            matching.insert(i);
        }
    }

    let mut with_context = std::collections::BTreeSet::new();
    for &idx in &matching {
        let start = idx.saturating_sub(opts.before);
        for b in start..idx {
            with_context.insert(b);
        }
        with_context.insert(idx);
        for a in (idx + 1)..(idx + 1 + opts.after).min(lines.len()) {
            with_context.insert(a);
        }
    }

    Ok(with_context.into_iter().map(|idx| format!("{}: {}", idx + 1, lines[idx])).collect::<Vec<_>>().join("\n"))
}

async fn read_console(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let mode = opt_str(args, "mode").unwrap_or("diff");
    let pages = args.get("pages").and_then(Value::as_u64).unwrap_or(1) as usize;

    if pages != 1 && mode != "num_pages" {
        return Err(ErrorRecord::new(
            ErrorCode::InvalidParameter,
            "'pages' can only be used with mode='num_pages'",
        ));
    }
    if !matches!(mode, "diff" | "last_page" | "num_pages" | "all") {
        return Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("invalid mode '{mode}'"))
            .with_context("valid_modes", json!(["diff", "last_page", "num_pages", "all"])));
    }

    auto_connect_console(app, node_name).await?;

    let output = match mode {
        "diff" => app.console.get_diff_by_node(node_name).await,
        "last_page" => app.console.get_output_by_node(node_name).await.map(|full| last_n_lines(&full, 25)),
        "num_pages" => app.console.get_output_by_node(node_name).await.map(|full| last_n_lines(&full, 25 * pages)),
        _ => app.console.get_output_by_node(node_name).await,
    };

    let Some(mut output) = output else {
        return Ok(json!("no output available"));
    };

    if let Some(pattern) = opt_str(args, "pattern") {
        let context = args.get("context").and_then(Value::as_u64).unwrap_or(0) as usize;
        let (before, after) = if context > 0 {
            (context, context)
        } else {
            (
                args.get("before").and_then(Value::as_u64).unwrap_or(0) as usize,
                args.get("after").and_then(Value::as_u64).unwrap_or(0) as usize,
            )
        };
        output = grep_filter(
            &output,
            pattern,
            GrepOptions { case_insensitive: opt_bool(args, "case_insensitive").unwrap_or(false), invert: opt_bool(args, "invert").unwrap_or(false), before, after },
        )?;
    }

    if output.is_empty() {
        return Ok(json!("no output available"));
    }
    Ok(json!(output))
}

fn last_n_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= n {
        text.to_string()
    } else {
        lines[lines.len() - n..].join("\n")
    }
}

async fn send_and_wait_console(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let command = require_str(args, "command")?;
    let raw = opt_bool(args, "raw").unwrap_or(false);
    let timeout = Duration::from_secs(args.get("timeout").and_then(Value::as_u64).unwrap_or(30));

    auto_connect_console(app, node_name).await?;
    let payload = normalize_console_text(command, raw);
    if !app.console.send_by_node(node_name, &payload).await {
        return Err(ErrorRecord::new(ErrorCode::ConsoleDisconnected, "failed to send command to console"));
    }

    let started = Instant::now();
    let mut pattern_found = false;
    let mut output = String::new();

    if let Some(wait_pattern) = opt_str(args, "wait_pattern") {
        let regex = Regex::new(wait_pattern).map_err(|e| {
            ErrorRecord::new(ErrorCode::InvalidParameter, "invalid regex pattern").with_details(e.to_string())
        })?;

        while started.elapsed() < timeout {
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            let chunk = app.console.get_diff_by_node(node_name).await.unwrap_or_default();
            output.push_str(&chunk);
            if regex.is_match(&output) {
                pattern_found = true;
                break;
            }
        }
    } else {
        tokio::time::sleep(Duration::from_secs(2)).await;
        output = app.console.get_diff_by_node(node_name).await.unwrap_or_default();
    }

    let timeout_occurred = opt_str(args, "wait_pattern").is_some() && !pattern_found;
    Ok(json!({
        "output": output,
        "pattern_found": pattern_found,
        "timeout_occurred": timeout_occurred,
        "wait_time": started.elapsed().as_secs_f64(),
    }))
}

/// Closed vocabulary of special key names to the byte sequences a telnet
/// console expects.
static SPECIAL_KEYS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("up", "\x1b[A"),
        ("down", "\x1b[B"),
        ("right", "\x1b[C"),
        ("left", "\x1b[D"),
        ("home", "\x1b[H"),
        ("end", "\x1b[F"),
        ("pageup", "\x1b[5~"),
        ("pagedown", "\x1b[6~"),
        ("enter", "\r\n"),
        ("backspace", "\x7f"),
        ("delete", "\x1b[3~"),
        ("tab", "\t"),
        ("esc", "\x1b"),
        ("ctrl_c", "\x03"),
        ("ctrl_d", "\x04"),
        ("ctrl_z", "\x1a"),
        ("ctrl_a", "\x01"),
        ("ctrl_e", "\x05"),
        ("f1", "\x1bOP"),
        ("f2", "\x1bOQ"),
        ("f3", "\x1bOR"),
        ("f4", "\x1bOS"),
        ("f5", "\x1b[15~"),
        ("f6", "\x1b[17~"),
        ("f7", "\x1b[18~"),
        ("f8", "\x1b[19~"),
        ("f9", "\x1b[20~"),
        ("f10", "\x1b[21~"),
        ("f11", "\x1b[23~"),
        ("f12", "\x1b[24~"),
    ])
});

async fn send_keystroke(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let key = require_str(args, "key")?.to_lowercase();

    let Some(sequence) = SPECIAL_KEYS.get(key.as_str()) else {
        let mut known: Vec<&&str> = SPECIAL_KEYS.keys().collect();
        known.sort();
        return Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("unknown key '{key}'"))
            .with_context("supported_keys", json!(known)));
    };

    auto_connect_console(app, node_name).await?;
    if !app.console.send_by_node(node_name, sequence).await {
        return Err(ErrorRecord::new(ErrorCode::ConsoleDisconnected, "failed to send keystroke"));
    }
    Ok(json!("sent successfully"))
}

async fn disconnect_console(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let success = app.console.disconnect_by_node(node_name).await;
    Ok(json!({
        "success": success,
        "node_name": node_name,
        "message": if success { "disconnected successfully" } else { "no active session for this node" },
    }))
}

async fn get_console_status(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    resources::get_resource(app, &format!("sessions://console/{node_name}")).await
}

// --- resource handler ---

async fn query_resource(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let uri = require_str(args, "uri")?;
    resources::get_resource(app, uri).await
}

// --- workflow prompt handler (spec component I) ---

/// Dispatches to one of the parameterized instructional texts in
/// [`crate::prompts`]. Pure string assembly, no GNS3 calls — this is the
/// only tool handler that never touches `AppContext`.
async fn get_workflow_prompt(args: &Value) -> MediatorResult<Value> {
    let name = require_str(args, "prompt_name")?;
    let text = match name {
        "ssh_setup" => {
            let node_name = require_str(args, "node_name")?;
            let device_type = require_str(args, "device_type")?;
            prompts::render_ssh_setup_prompt(node_name, device_type, opt_str(args, "username"), opt_str(args, "password"))
        }
        "topology_discovery" => prompts::render_topology_discovery_prompt(opt_str(args, "project_name")),
        "troubleshooting" => {
            let node_name = require_str(args, "node_name")?;
            prompts::render_troubleshooting_prompt(node_name, opt_str(args, "symptom"))
        }
        "lab_setup" => {
            let project_name = require_str(args, "project_name")?;
            prompts::render_lab_setup_prompt(project_name, opt_u32(args, "node_count"))
        }
        other => {
            return Err(ErrorRecord::new(ErrorCode::InvalidParameter, format!("unknown prompt '{other}'"))
                .with_context("valid_prompts", json!(["ssh_setup", "topology_discovery", "troubleshooting", "lab_setup"])));
        }
    };
    Ok(json!(text))
}

// --- SSH-proxy-delegating handlers ---

async fn configure_ssh(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    if let Some(proxy) = opt_str(args, "proxy") {
        app.set_ssh_proxy(node_name, proxy.to_string()).await;
    }
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.status(&base_url, node_name).await
}

async fn ssh_send_command(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.execute_ssh(&base_url, args).await
}

async fn ssh_send_tftp(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.execute_tftp(&base_url, args).await
}

async fn ssh_send_http_client(app: &AppContext, args: &Value) -> MediatorResult<Value> {
    let node_name = require_str(args, "node_name")?;
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.execute_http_client(&base_url, args).await
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
