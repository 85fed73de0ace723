// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::context;

#[test]
fn normalize_console_text_interprets_escapes_then_folds_to_crlf() {
    assert_eq!(normalize_console_text("show version\\n", false), "show version\r\n");
    assert_eq!(normalize_console_text("a\\r\\nb", false), "a\r\nb");
}

#[test]
fn normalize_console_text_is_idempotent_on_existing_crlf() {
    // Fold-down-then-up: text already using CRLF round-trips unchanged
    // instead of being doubled (SPEC_FULL.md §4.B supplement).
    let input = "line one\r\nline two\r\n";
    assert_eq!(normalize_console_text(input, false), input);
}

#[test]
fn normalize_console_text_raw_bypasses_everything() {
    assert_eq!(normalize_console_text("a\\nb", true), "a\\nb");
}

#[test]
fn grep_filter_keeps_matching_lines_with_line_numbers() {
    let text = "alpha\nbeta\ngamma\nbeta again\n";
    let out = grep_filter(text, "beta", GrepOptions { case_insensitive: false, invert: false, before: 0, after: 0 }).unwrap();
    assert_eq!(out, "2: beta\n4: beta again");
}

#[test]
fn grep_filter_invert_keeps_non_matching_lines() {
    let text = "alpha\nbeta\ngamma\n";
    let out = grep_filter(text, "beta", GrepOptions { case_insensitive: false, invert: true, before: 0, after: 0 }).unwrap();
    assert_eq!(out, "1: alpha\n3: gamma");
}

#[test]
fn grep_filter_context_pulls_in_surrounding_lines_without_duplicates() {
    let text = "one\ntwo\nthree\nfour\nfive\n";
    let out = grep_filter(text, "three", GrepOptions { case_insensitive: false, invert: false, before: 1, after: 1 }).unwrap();
    assert_eq!(out, "2: two\n3: three\n4: four");
}

#[test]
fn grep_filter_rejects_invalid_regex() {
    let err = grep_filter("x", "(", GrepOptions { case_insensitive: false, invert: false, before: 0, after: 0 }).unwrap_err();
    assert_eq!(err.error_code, ErrorCode::InvalidParameter);
}

#[test]
fn special_keys_cover_the_documented_vocabulary() {
    for key in ["up", "down", "left", "right", "enter", "ctrl_c", "esc", "tab", "f12"] {
        assert!(SPECIAL_KEYS.contains_key(key), "missing special key '{key}'");
    }
    assert_eq!(SPECIAL_KEYS.get("ctrl_c"), Some(&"\x03"));
}

#[test]
fn render_debian_interfaces_emits_loopback_and_static_and_dhcp_stanzas() {
    let interfaces = vec![
        NetworkInterfaceConfig::Static {
            name: "eth0".to_string(),
            address: "192.168.1.10".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: Some("192.168.1.1".to_string()),
            dns: None,
        },
        NetworkInterfaceConfig::Dhcp { name: "eth1".to_string() },
    ];
    let rendered = render_debian_interfaces(&interfaces);
    assert!(rendered.contains("auto lo"));
    assert!(rendered.contains("iface eth0 inet static"));
    assert!(rendered.contains("address 192.168.1.10"));
    assert!(rendered.contains("gateway 192.168.1.1"));
    assert!(rendered.contains("iface eth1 inet dhcp"));
}

#[test]
fn rectangle_svg_embeds_dimensions_and_colors() {
    let svg = rectangle_svg(100, 50, "#ff0000", "#000000", 2);
    assert!(svg.contains("width=\"100\""));
    assert!(svg.contains("height=\"50\""));
    assert!(svg.contains("fill=\"#ff0000\""));
}

#[test]
fn text_svg_escapes_markup_characters() {
    let svg = text_svg("<R1>", 12, "normal", "TypeWriter", "#000000");
    assert!(svg.contains("&lt;R1&gt;"));
    assert!(!svg.contains("<R1>"));
}

#[tokio::test]
async fn dispatch_reports_unknown_tool_as_invalid_parameter() {
    let app = context::test_app("http://127.0.0.1:1", "http://127.0.0.1:1");
    let result = dispatch(&app, "not_a_real_tool", json!({})).await;
    assert_eq!(result.get("error_code").and_then(|v| v.as_str()), Some("INVALID_PARAMETER"));
}

#[tokio::test]
async fn dispatch_reports_missing_required_parameter() {
    let app = context::test_app("http://127.0.0.1:1", "http://127.0.0.1:1");
    let result = dispatch(&app, "open_project", json!({})).await;
    assert_eq!(result.get("error_code").and_then(|v| v.as_str()), Some("MISSING_PARAMETER"));
}

#[tokio::test]
async fn send_keystroke_rejects_unknown_key_name() {
    let app = context::test_app("http://127.0.0.1:1", "http://127.0.0.1:1");
    let result = dispatch(&app, "send_keystroke", json!({ "node_name": "R1", "key": "not_a_key" })).await;
    assert_eq!(result.get("error_code").and_then(|v| v.as_str()), Some("INVALID_PARAMETER"));
}
