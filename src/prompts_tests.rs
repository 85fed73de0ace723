use super::*;

#[test]
fn ssh_setup_includes_node_and_device_commands() {
    let text = render_ssh_setup_prompt("r1", "cisco_ios", None, None);
    assert!(text.contains("r1"));
    assert!(text.contains("crypto key generate rsa modulus 2048"));
    assert!(text.contains("admin"), "should fall back to default username/password");
}

#[test]
fn ssh_setup_honors_explicit_credentials() {
    let text = render_ssh_setup_prompt("sw1", "cisco_nxos", Some("netops"), Some("hunter2"));
    assert!(text.contains("username netops password hunter2"));
}

#[test]
fn ssh_setup_unknown_device_falls_back_to_generic_steps() {
    let text = render_ssh_setup_prompt("box1", "some_custom_os", None, None);
    assert!(text.contains("No device-specific recipe for 'some_custom_os'"));
}

#[test]
fn topology_discovery_without_project_prompts_for_selection() {
    let text = render_topology_discovery_prompt(None);
    assert!(text.contains("Select a project"));
}

#[test]
fn topology_discovery_with_project_names_it() {
    let text = render_topology_discovery_prompt(Some("datacenter-lab"));
    assert!(text.contains("datacenter-lab"));
}

#[test]
fn troubleshooting_includes_symptom_when_given() {
    let text = render_troubleshooting_prompt("r1", Some("no ping reply"));
    assert!(text.contains("no ping reply"));
    assert!(text.contains("r1"));
}

#[test]
fn troubleshooting_omits_symptom_section_when_absent() {
    let text = render_troubleshooting_prompt("r1", None);
    assert!(!text.contains("Reported symptom"));
}

#[test]
fn lab_setup_includes_project_name_and_sizing() {
    let text = render_lab_setup_prompt("new-lab", Some(12));
    assert!(text.contains("new-lab"));
    assert!(text.contains("roughly 12 nodes"));
}

#[test]
fn lab_setup_omits_sizing_when_not_given() {
    let text = render_lab_setup_prompt("new-lab", None);
    assert!(!text.contains("Planning for"));
}

#[test]
fn device_ssh_commands_substitutes_credentials_for_mikrotik() {
    let text = device_ssh_commands("mikrotik_routeros", "r2", "admin2", "s3cret");
    assert!(text.contains("name=admin2 password=s3cret"));
}
