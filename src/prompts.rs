// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameterized instructional text handed back to an agent on request
//! (spec component I). Pure string assembly — no GNS3 calls, no state.

/// Per-device-type SSH bring-up commands, recovered from
/// `original_source/gns3_mcp/server/prompts/ssh_setup.py`'s `DEVICE_CONFIGS`
/// table. Falls back to generic guidance for anything not listed.
fn device_ssh_commands(device_type: &str, node_name: &str, username: &str, password: &str) -> String {
    match device_type {
        "cisco_ios" => format!(
            "send_console(node_name=\"{node_name}\", data=\"configure terminal\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"username {username} privilege 15 secret {password}\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"crypto key generate rsa modulus 2048\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"ip ssh version 2\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"line vty 0 4\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"login local\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"transport input ssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"end\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"write memory\\n\")\n\n\
             Note: if the RSA key step prompts to replace existing keys, answer with a follow-up send_console(data=\"yes\\n\")."
        ),
        "cisco_nxos" => format!(
            "send_console(node_name=\"{node_name}\", data=\"configure terminal\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"feature ssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"username {username} password {password} role network-admin\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"ssh key rsa 2048\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"end\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"copy running-config startup-config\\n\")"
        ),
        "mikrotik_routeros" => format!(
            "send_console(node_name=\"{node_name}\", data=\"/user add name={username} password={password} group=full\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"/ip service enable ssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"/ip service set ssh port=22\\n\")"
        ),
        "juniper_junos" => format!(
            "send_console(node_name=\"{node_name}\", data=\"configure\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"set system login user {username} class super-user authentication plain-text-password\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"{password}\\n\")  # password prompt, sent twice\n\
             send_console(node_name=\"{node_name}\", data=\"{password}\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"set system services ssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"commit and-quit\\n\")"
        ),
        "arista_eos" => format!(
            "send_console(node_name=\"{node_name}\", data=\"configure\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"username {username} privilege 15 secret {password}\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"management ssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"idle-timeout 0\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"exit\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"end\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"write memory\\n\")"
        ),
        "linux" => format!(
            "# Alpine\n\
             send_console(node_name=\"{node_name}\", data=\"apk add openssh\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"passwd\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"{password}\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"{password}\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"rc-service sshd start\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"rc-update add sshd\\n\")\n\n\
             # Debian/Ubuntu\n\
             send_console(node_name=\"{node_name}\", data=\"apt-get install -y openssh-server\\n\")\n\
             send_console(node_name=\"{node_name}\", data=\"systemctl enable --now ssh\\n\")"
        ),
        other => format!(
            "No device-specific recipe for '{other}'. General steps:\n\
             1. Use send_console() to reach configuration mode\n\
             2. Create an administrative user account\n\
             3. Enable the SSH service\n\
             4. Generate SSH host keys if the platform requires them\n\
             5. Save the configuration\n\
             Consult the device's documentation for exact commands."
        ),
    }
}

/// Device bring-up workflow, recovered from
/// `original_source/gns3_mcp/server/prompts/ssh_setup.py`.
pub fn render_ssh_setup_prompt(node_name: &str, device_type: &str, username: Option<&str>, password: Option<&str>) -> String {
    let username = username.unwrap_or("admin");
    let password = password.unwrap_or("admin");
    let commands = device_ssh_commands(device_type, node_name, username, password);

    format!(
        "# SSH Setup Workflow for {node_name}\n\n\
         This workflow enables SSH access on **{node_name}** ({device_type}).\n\n\
         ## Prerequisites\n\
         - Node must be started (check `projects://{{project_id}}/nodes/`)\n\
         - Console access available (check `sessions://console/{node_name}`)\n\
         - Know the device's management IP address\n\n\
         ## Step 1: Configure SSH via console\n\n\
         {commands}\n\n\
         ## Step 2: Verify configuration\n\
         read_console(node_name=\"{node_name}\", mode=\"diff\")\n\n\
         ## Step 3: Find the management IP\n\
         Send the platform's interface-listing command and read back `mode=\"last_page\"`.\n\n\
         ## Step 4: Establish the SSH session\n\
         Direct connection (device reachable from the GNS3 host):\n\
         configure_ssh(node_name=\"{node_name}\", device_type=\"{device_type}\", host=\"<management-ip>\", username=\"{username}\", password=\"{password}\")\n\n\
         Through a lab proxy (device on an isolated network): discover available proxies with `proxies://`, then pass \
         `proxy=\"<proxy_id>\"` to the same `configure_ssh` call. Subsequent `ssh_send_command` calls for this node route \
         through the same proxy automatically.\n\n\
         ## Step 5: Test the connection\n\
         ssh_send_command(node_name=\"{node_name}\", command=\"show version\")\n\n\
         ## Step 6: Confirm session status\n\
         Resource `sessions://ssh/{node_name}`\n\n\
         ## Troubleshooting\n\
         - Connection refused: confirm the SSH service is running and reachable\n\
         - Authentication failed: re-check the username/password and the account's privilege level\n\
         - Timeout: confirm the management interface has the expected address\n\n\
         Once SSH is working, prefer `ssh_send_command` over the console for scripted work — it gets prompt-aware \
         completion detection the console tools don't have."
    )
}

/// Network-discovery workflow, recovered from
/// `original_source/mcp-server/server/prompts/topology_discovery.py`.
pub fn render_topology_discovery_prompt(project_name: Option<&str>) -> String {
    let project_section = match project_name {
        Some(name) => format!("**Project: {name}**"),
        None => "## Step 1: Select a project\n\
                 Call `list_projects()` or browse `projects://` to find the project to explore."
            .to_string(),
    };

    format!(
        "# Topology Discovery Workflow\n\n\
         {project_section}\n\n\
         ## Step 2: Discover nodes\n\
         Resource `projects://{{project_id}}/nodes/` lists every node with its type, status, console info, and ports; \
         `projects://{{project_id}}/nodes/{{node_id}}` gives full detail on one.\n\n\
         ## Step 3: Discover links\n\
         Resource `projects://{{project_id}}/links/` maps every connection: which two nodes, which adapter/port on each \
         side, and whether the link is currently suspended.\n\n\
         ## Step 4: Discover templates and drawings\n\
         `projects://{{project_id}}/templates/` lists installed device templates; `projects://{{project_id}}/drawings/` \
         lists the rectangles, ellipses, lines, and text annotations already placed on the canvas.\n\n\
         ## Step 5: Pull the aggregated view\n\
         Resource `projects://{{project_id}}/topology` returns node/link counts and capture state in one call — useful \
         as a first pass before drilling into individual nodes.\n\n\
         ## Step 6: Identify the topology pattern\n\
         Hub-and-spoke, full mesh, partial mesh, or tiered — and note any single point of failure.\n\n\
         ## Troubleshooting\n\
         - Project not found: re-check the name (case-sensitive) against `list_projects()`\n\
         - No nodes returned: confirm the project is open\n\
         - Missing link info: links are only reported once both endpoints are wired in the GNS3 GUI\n\n\
         ## Next steps\n\
         Once the topology is mapped: document findings, identify gaps, and move to device access via \
         `send_console`/`ssh_send_command` as needed."
    )
}

/// Fault-diagnosis workflow. The original's `troubleshooting.py` was not
/// present in the retrieved source; this follows the step/troubleshooting/
/// next-steps shape the sibling prompts in this module use.
pub fn render_troubleshooting_prompt(node_name: &str, symptom: Option<&str>) -> String {
    let symptom_section = match symptom {
        Some(s) => format!("**Reported symptom:** {s}\n"),
        None => String::new(),
    };

    format!(
        "# Troubleshooting Workflow for {node_name}\n\n\
         {symptom_section}\n\
         ## Step 1: Confirm node state\n\
         Resource `projects://{{project_id}}/nodes/{{node_id}}` (or `get_node_details(node_name=\"{node_name}\")`) — check \
         `status`. A stopped or suspended node explains most connectivity symptoms before anything else is investigated.\n\n\
         ## Step 2: Check the console\n\
         `sessions://console/{node_name}` reports whether a session is open. If not, `send_console` auto-connects on \
         first use; `read_console(node_name=\"{node_name}\", mode=\"last_page\")` shows recent boot/login output.\n\n\
         ## Step 3: Check link state\n\
         Resource `projects://{{project_id}}/links/` — a link reported as suspended behaves as disconnected even though \
         both endpoints exist.\n\n\
         ## Step 4: Run a platform diagnostic\n\
         Typical commands: `show ip interface brief` / `show interfaces terse` / `ip addr` depending on platform, sent via \
         `send_console` and read back with `read_console(mode=\"diff\")`.\n\n\
         ## Step 5: Check the SSH path, if configured\n\
         Resource `sessions://ssh/{node_name}` and `sessions://ssh/{node_name}/history` show the last commands run and \
         whether the session is still alive.\n\n\
         ## Common causes\n\
         - Node stopped or suspended (see Step 1)\n\
         - Link suspended or never created (see Step 3)\n\
         - Wrong adapter/port number in a prior `set_connection` call\n\
         - Device not yet finished booting — re-check after a short wait\n\n\
         ## Next steps\n\
         Once the cause is identified, use `set_node` (state changes) or `set_connection` (link changes) to correct it, \
         then repeat Step 2–4 to confirm the symptom cleared."
    )
}

/// Guided new-lab bring-up. Like `render_troubleshooting_prompt`, the
/// original's `lab_setup.py` was not present in the retrieved source; this
/// follows the same structural shape as the other prompts in this module.
pub fn render_lab_setup_prompt(project_name: &str, node_count: Option<u32>) -> String {
    let sizing = match node_count {
        Some(n) => format!("Planning for roughly {n} nodes.\n"),
        None => String::new(),
    };

    format!(
        "# Lab Setup Workflow for '{project_name}'\n\n\
         {sizing}\
         ## Step 1: Create the project\n\
         create_project(name=\"{project_name}\")\n\n\
         ## Step 2: Survey available templates\n\
         Resource `templates://` lists installed device templates; pick one whose `template_type` matches what the lab \
         needs (router, switch, Docker host, ...).\n\n\
         ## Step 3: Place nodes\n\
         create_node(template_name=\"...\", node_name=\"...\", x=..., y=...) once per device. Space nodes out on the \
         canvas (x/y) so links are legible once drawn.\n\n\
         ## Step 4: Wire the topology\n\
         set_connection(operations=[{{\"action\": \"connect\", \"node_a\": \"...\", \"node_b\": \"...\", \"port_a\": 0, \
         \"port_b\": 0}}, ...]) as one batch — it validates every leg before touching the emulator.\n\n\
         ## Step 5: Start the lab\n\
         set_node(node_name=\"...\", action=\"start\") per node, or iterate the full node list from \
         `projects://{{project_id}}/nodes/`.\n\n\
         ## Step 6: Annotate\n\
         create_drawing(...) for zone boundaries or labels (rectangle/ellipse/line/text) helps anyone opening the lab \
         later understand its structure at a glance.\n\n\
         ## Next steps\n\
         Once nodes are started, move to device configuration via `send_console`, or to the \"SSH Setup Workflow\" prompt \
         once a device has a reachable management address."
    )
}

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
