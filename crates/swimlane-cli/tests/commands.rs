//! End-to-end tests that run the `swimlane` binary
//!
//! Each test works in its own temp directory and checks exit status,
//! stdout and the files written.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const PROCESS_JSON: &str = r#"{
    "processName": "Incident",
    "participants": ["Support", "Engineering"],
    "trigger": "Ticket opened",
    "activities": ["Triage", "Fix"],
    "decisionPoints": ["Reproducible?"],
    "endEvent": "Ticket closed"
}"#;

fn swimlane(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_swimlane"))
        .args(args)
        .env("SWIMLANE_LOG_LEVEL", "off")
        .output()
        .unwrap()
}

fn swimlane_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_swimlane"))
        .args(args)
        .env("SWIMLANE_LOG_LEVEL", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn generate_into(dir: &Path) -> String {
    let json = dir.join("process.json");
    let bpmn = dir.join("process.bpmn");
    std::fs::write(&json, PROCESS_JSON).unwrap();
    let output = swimlane(&[
        "generate",
        "-i",
        json.to_str().unwrap(),
        "-o",
        bpmn.to_str().unwrap(),
        "--run-token",
        "77",
    ]);
    assert!(output.status.success(), "{:?}", output);
    bpmn.to_str().unwrap().to_string()
}

#[test]
fn test_generate_validate_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let bpmn = generate_into(dir.path());

    let validate = swimlane(&["validate", "-i", &bpmn]);
    assert!(validate.status.success());
    assert!(String::from_utf8_lossy(&validate.stdout).contains("Valid BPMN document"));

    let inspect = swimlane(&["inspect", "-i", &bpmn, "--json"]);
    assert!(inspect.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&inspect.stdout).unwrap();
    assert_eq!(summary["process_name"], "Incident");
    assert_eq!(summary["node_count"], 5);
    assert_eq!(summary["lanes"][1], "Engineering");
}

#[test]
fn test_generate_from_stdin_to_stdout() {
    let output = swimlane_stdin(&["generate", "--run-token", "1"], PROCESS_JSON);
    assert!(output.status.success());
    let xml = String::from_utf8_lossy(&output.stdout);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("_1\""));
}

#[test]
fn test_render_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let bpmn = generate_into(dir.path());
    let svg = dir.path().join("out.svg");

    let output = swimlane(&[
        "render",
        "-i",
        &bpmn,
        "-o",
        svg.to_str().unwrap(),
        "--width",
        "640",
        "--height",
        "480",
        "--zoom-in",
        "2",
    ]);
    assert!(output.status.success(), "{:?}", output);
    let content = std::fs::read_to_string(svg).unwrap();
    assert!(content.contains("viewBox=\"0 0 640 480\""));
    assert!(content.contains("Triage"));
}

#[test]
fn test_validate_json_reports_fatal() {
    let output = swimlane_stdin(&["validate", "--json"], "<definitions/>");
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fatal"], true);
    assert!(report["issues"].as_array().unwrap().len() >= 2);
}

#[test]
fn test_repair_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let bpmn = generate_into(dir.path());
    let xml = std::fs::read_to_string(bpmn).unwrap();

    let output = swimlane_stdin(&["repair"], &format!("```xml\n{}\n```", xml));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("<?xml"));
}

#[test]
fn test_detect() {
    let dir = tempfile::tempdir().unwrap();
    let bpmn = generate_into(dir.path());

    let output = swimlane(&["detect", "-i", &bpmn]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "bpmn");

    let unknown = swimlane_stdin(&["detect"], "just some words");
    assert!(!unknown.status.success());
}

#[test]
fn test_missing_input_file() {
    let output = swimlane(&["inspect", "-i", "/definitely/not/here.bpmn"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read input file"));
}
