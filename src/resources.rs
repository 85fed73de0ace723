// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only resource catalogue: agents browse project/node/console state
//! through a small set of URI schemes instead of calling tools for data
//! that doesn't need a side effect.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::{ErrorCode, ErrorRecord, MediatorResult};

struct Pattern {
    regex: Regex,
    handler: &'static str,
}

/// Patterns in the order they're documented, so an unknown-URI error can
/// enumerate them back to the agent verbatim.
const PATTERN_TABLE: &[(&str, &str)] = &[
    (r"^projects://$", "list_projects"),
    (r"^projects://(?P<project_id>[^/]+)$", "get_project"),
    (r"^projects://(?P<project_id>[^/]+)/nodes/$", "list_nodes"),
    (r"^projects://(?P<project_id>[^/]+)/nodes/(?P<node_id>[^/]+)$", "get_node"),
    (r"^projects://(?P<project_id>[^/]+)/nodes/(?P<node_id>[^/]+)/template$", "get_node_template"),
    (r"^projects://(?P<project_id>[^/]+)/links/$", "list_links"),
    (r"^projects://(?P<project_id>[^/]+)/drawings/$", "list_drawings"),
    (r"^projects://(?P<project_id>[^/]+)/snapshots/$", "list_snapshots"),
    (r"^projects://(?P<project_id>[^/]+)/snapshots/(?P<snapshot_id>[^/]+)$", "get_snapshot"),
    (r"^projects://(?P<project_id>[^/]+)/topology$", "get_topology"),
    (r"^projects://(?P<project_id>[^/]+)/readme$", "get_readme"),
    (r"^templates://$", "list_templates"),
    (r"^templates://(?P<template_id>[^/]+)$", "get_template"),
    (r"^sessions://console/$", "list_console_sessions"),
    (r"^sessions://console/(?P<node_name>[^/]+)$", "get_console_session"),
    (r"^sessions://ssh/$", "list_ssh_sessions"),
    (r"^sessions://ssh/(?P<node_name2>[^/]+)/history$", "get_ssh_history"),
    (r"^sessions://ssh/(?P<node_name2>[^/]+)/buffer$", "get_ssh_buffer"),
    (r"^sessions://ssh/(?P<node_name2>[^/]+)$", "get_ssh_session"),
    (r"^proxies://$", "list_proxies"),
    (r"^proxies://(?P<proxy_id>[^/]+)$", "get_proxy"),
];

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|(p, h)| Pattern {
            // Every pattern above is a fixed literal; a build that can't compile one is broken, not recoverable at runtime.
            #[allow(clippy::expect_used)]
            regex: Regex::new(p).expect("static resource pattern is valid"),
            handler: h,
        })
        .collect()
});

fn parse_uri(uri: &str) -> Option<(&'static str, regex::Captures<'_>)> {
    PATTERNS.iter().find_map(|p| p.regex.captures(uri).map(|c| (p.handler, c)))
}

/// Every handler name in [`PATTERN_TABLE`] is only reached via its own
/// pattern's captures, so the named group it asks for always matched; this
/// still returns a proper error instead of unwrapping, since a future
/// pattern/handler edit could desync the two without the compiler noticing.
fn cap<'a>(caps: &regex::Captures<'a>, name: &str) -> MediatorResult<&'a str> {
    caps.name(name)
        .map(|m| m.as_str())
        .ok_or_else(|| ErrorRecord::new(ErrorCode::InternalError, format!("resource route missing capture '{name}'")))
}

/// The raw pattern strings, in documented order, for the unknown-URI error.
fn supported_patterns() -> Vec<&'static str> {
    PATTERN_TABLE.iter().map(|(p, _)| *p).collect()
}

/// Route `uri` to the matching read-only handler and return its JSON body.
pub async fn get_resource(app: &AppContext, uri: &str) -> MediatorResult<Value> {
    let Some((handler, caps)) = parse_uri(uri) else {
        return Err(ErrorRecord::new(ErrorCode::InvalidParameter, "unrecognized resource URI")
            .with_context("uri", uri)
            .with_context("supported_patterns", json!(supported_patterns()))
            .with_suggested_action("use one of the supported URI patterns listed in context.supported_patterns"));
    };

    match handler {
        "list_projects" => list_projects(app).await,
        "get_project" => get_project(app, cap(&caps, "project_id")?).await,
        "list_nodes" => list_nodes(app, cap(&caps, "project_id")?).await,
        "get_node" => get_node(app, cap(&caps, "project_id")?, cap(&caps, "node_id")?).await,
        "get_node_template" => get_node_template(app, cap(&caps, "project_id")?, cap(&caps, "node_id")?).await,
        "list_links" => list_links(app, cap(&caps, "project_id")?).await,
        "list_drawings" => list_drawings(app, cap(&caps, "project_id")?).await,
        "list_snapshots" => list_snapshots(app, cap(&caps, "project_id")?).await,
        "get_snapshot" => get_snapshot(app, cap(&caps, "project_id")?, cap(&caps, "snapshot_id")?).await,
        "get_topology" => get_topology(app, cap(&caps, "project_id")?).await,
        "get_readme" => get_readme(app, cap(&caps, "project_id")?).await,
        "list_templates" => list_templates(app).await,
        "get_template" => get_template(app, cap(&caps, "template_id")?).await,
        "list_console_sessions" => list_console_sessions(app).await,
        "get_console_session" => get_console_session(app, cap(&caps, "node_name")?).await,
        "list_ssh_sessions" => list_ssh_sessions(app).await,
        "get_ssh_session" => get_ssh_session(app, cap(&caps, "node_name2")?).await,
        "get_ssh_history" => get_ssh_history(app, cap(&caps, "node_name2")?).await,
        "get_ssh_buffer" => get_ssh_buffer(app, cap(&caps, "node_name2")?).await,
        "list_proxies" => list_proxies(app).await,
        "get_proxy" => get_proxy(app, cap(&caps, "proxy_id")?).await,
        other => Err(ErrorRecord::new(ErrorCode::InternalError, format!("resource route '{other}' has no handler"))),
    }
}

async fn list_projects(app: &AppContext) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_projects().await?))
}

async fn get_project(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    let projects = app.gns3.get_projects().await?;
    projects
        .into_iter()
        .find(|p| p.get("project_id").and_then(Value::as_str) == Some(project_id))
        .ok_or_else(|| ErrorRecord::new(ErrorCode::ProjectNotFound, format!("project '{project_id}' not found")))
}

async fn list_nodes(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_nodes(project_id).await?))
}

async fn get_node(app: &AppContext, project_id: &str, node_id: &str) -> MediatorResult<Value> {
    let nodes = app.gns3.get_nodes(project_id).await?;
    nodes
        .into_iter()
        .find(|n| n.get("node_id").and_then(Value::as_str) == Some(node_id))
        .ok_or_else(|| ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_id}' not found")))
}

async fn list_links(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_links(project_id).await?))
}

async fn list_drawings(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_drawings(project_id).await?))
}

async fn list_snapshots(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_snapshots(project_id).await?))
}

async fn get_snapshot(app: &AppContext, project_id: &str, snapshot_id: &str) -> MediatorResult<Value> {
    let snapshots = app.gns3.get_snapshots(project_id).await?;
    snapshots
        .into_iter()
        .find(|s| s.get("snapshot_id").and_then(Value::as_str) == Some(snapshot_id))
        .ok_or_else(|| ErrorRecord::new(ErrorCode::SnapshotNotFound, format!("snapshot '{snapshot_id}' not found")))
}

async fn get_readme(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    let content = app.gns3.get_project_readme(project_id).await?;
    Ok(json!({ "project_id": project_id, "content": content }))
}

async fn list_templates(app: &AppContext) -> MediatorResult<Value> {
    Ok(json!(app.gns3.get_templates().await?))
}

async fn get_template(app: &AppContext, template_id: &str) -> MediatorResult<Value> {
    app.gns3.get_template(template_id).await
}

/// Template-usage note for a node: which template (if any) shares its node
/// type, so an agent recreating or cloning a node knows where to start.
async fn get_node_template(app: &AppContext, project_id: &str, node_id: &str) -> MediatorResult<Value> {
    let nodes = app.gns3.get_nodes(project_id).await?;
    let node = nodes
        .into_iter()
        .find(|n| n.get("node_id").and_then(Value::as_str) == Some(node_id))
        .ok_or_else(|| ErrorRecord::new(ErrorCode::NodeNotFound, format!("node '{node_id}' not found")))?;

    let node_type = node.get("node_type").and_then(Value::as_str).unwrap_or_default();
    let templates = app.gns3.get_templates().await?;
    let candidates: Vec<&Value> = templates
        .iter()
        .filter(|t| t.get("template_type").and_then(Value::as_str) == Some(node_type))
        .collect();

    Ok(json!({
        "node_id": node_id,
        "node_type": node_type,
        "matching_templates": candidates,
        "note": if candidates.is_empty() {
            "no installed template shares this node's type; create_node() will need a manually chosen template".to_string()
        } else {
            format!("{} template(s) share node type '{node_type}'", candidates.len())
        },
    }))
}

/// Delegate to the SSH-proxy sidecar, aggregating the default proxy and
/// any per-node override recorded in `AppContext`.
async fn list_ssh_sessions(app: &AppContext) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy.default_base_url().to_string();
    app.ssh_proxy.sessions(&base_url).await
}

async fn get_ssh_session(app: &AppContext, node_name: &str) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.status(&base_url, node_name).await
}

async fn get_ssh_history(app: &AppContext, node_name: &str) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.history(&base_url, node_name).await
}

async fn get_ssh_buffer(app: &AppContext, node_name: &str) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy_base_url(node_name).await;
    app.ssh_proxy.buffer(&base_url, node_name).await
}

async fn list_proxies(app: &AppContext) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy.default_base_url().to_string();
    app.ssh_proxy.registry(&base_url).await
}

async fn get_proxy(app: &AppContext, proxy_id: &str) -> MediatorResult<Value> {
    let base_url = app.ssh_proxy.default_base_url().to_string();
    let registry = app.ssh_proxy.registry(&base_url).await?;
    let proxies = registry.get("proxies").and_then(Value::as_array).cloned().unwrap_or_default();
    proxies
        .into_iter()
        .find(|p| p.get("proxy_id").and_then(Value::as_str) == Some(proxy_id))
        .ok_or_else(|| {
            ErrorRecord::new(ErrorCode::SshConnectionFailed, format!("proxy '{proxy_id}' not found in registry"))
        })
}

async fn list_console_sessions(app: &AppContext) -> MediatorResult<Value> {
    Ok(json!(app.console.list_sessions().await))
}

async fn get_console_session(app: &AppContext, node_name: &str) -> MediatorResult<Value> {
    if !app.console.has_session(node_name).await {
        return Ok(json!({ "connected": false, "node_name": node_name }));
    }
    let sessions = app.console.list_sessions().await;
    let session_id = app.console.get_session_id(node_name).await;
    let info = session_id.as_ref().and_then(|id| sessions.get(id));
    Ok(json!({ "connected": true, "node_name": node_name, "session": info }))
}

/// Aggregated node/link/capture report for a project, matching the
/// original's `topology` resource.
async fn get_topology(app: &AppContext, project_id: &str) -> MediatorResult<Value> {
    let nodes = app.gns3.get_nodes(project_id).await?;
    let links = app.gns3.get_links(project_id).await?;

    let started = nodes.iter().filter(|n| n.get("status").and_then(Value::as_str) == Some("started")).count();
    let capturing = links.iter().filter(|l| l.get("capturing").and_then(Value::as_bool).unwrap_or(false)).count();

    Ok(json!({
        "project_id": project_id,
        "node_count": nodes.len(),
        "nodes_started": started,
        "link_count": links.len(),
        "links_capturing": capturing,
        "nodes": nodes,
        "links": links,
    }))
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
