//! CLI integration tests
//!
//! These tests run the `ocil` binary, which is only built with the `cli`
//! feature.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn ocil_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ocil"))
}

fn sample_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("sample.xml");
    path
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect_summary() {
    let output = Command::new(ocil_bin())
        .args(["inspect", sample_path().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "inspect should succeed");
    assert!(stdout.contains("ocil-rs"), "should show version");
    assert!(stdout.contains("Schema Version: 2.0"), "should show schema version");
    assert!(stdout.contains("Questionnaires: 2"), "should count questionnaires");
    assert!(
        stdout.contains("Test Actions: 5 (1 compound, 4 question)"),
        "should break down test actions"
    );
    assert!(
        stdout.contains("Questions: 4 (1 boolean, 1 choice, 1 numeric, 1 string)"),
        "should break down questions"
    );
    assert!(stdout.contains("ocil:org.example:questionnaire:2 : FAIL"));
}

#[test]
fn test_cli_inspect_json_output() {
    let output = Command::new(ocil_bin())
        .args(["inspect", "--json", sample_path().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "inspect --json should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");

    assert_eq!(json["generator"]["schema_version"], "2.0");
    assert_eq!(json["questions"]["choice_groups"][0]["id"], "ocil:org.example:choicegroup:1");
}

#[test]
fn test_cli_inspect_missing_file() {
    let output = Command::new(ocil_bin())
        .args(["inspect", "does-not-exist.xml"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "should fail for a missing file");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error:"), "should report the error");
}

#[test]
fn test_cli_inspect_lax_accepts_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.xml");
    let xml = std::fs::read_to_string(sample_path())
        .unwrap()
        .replace("<schema_version>2.0", "<schema_version>3.0");
    std::fs::write(&path, xml).unwrap();

    let strict = Command::new(ocil_bin())
        .args(["inspect", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(!strict.status.success(), "strict mode should reject 3.0");
    assert!(String::from_utf8_lossy(&strict.stderr).contains("schema version"));

    let lax = Command::new(ocil_bin())
        .args(["inspect", "--lax", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(lax.status.success(), "lax mode should accept 3.0");
    assert!(String::from_utf8_lossy(&lax.stdout).contains("Schema Version: 3.0"));
}

// ============================================================================
// Skeleton and Normalize Command Tests
// ============================================================================

#[test]
fn test_cli_skeleton_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skeleton.xml");

    let output = Command::new(ocil_bin())
        .args(["skeleton", "--output", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "skeleton should succeed");

    let ocil = ocil::Ocil::from_xml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(!ocil.generator.timestamp.is_zero());
    assert!(ocil.questionnaires.is_empty());
}

#[test]
fn test_cli_normalize_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("normalized.xml");

    let output = Command::new(ocil_bin())
        .args([
            "normalize",
            "--indent",
            "0",
            "--output",
            path.to_str().unwrap(),
            sample_path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "normalize should succeed");

    let original = ocil::Ocil::from_xml(&std::fs::read_to_string(sample_path()).unwrap()).unwrap();
    let normalized = ocil::Ocil::from_xml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(normalized, original);
}

#[test]
fn test_cli_normalize_to_stdout() {
    let output = Command::new(ocil_bin())
        .args(["normalize", sample_path().to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "normalize should succeed");
    assert!(stdout.starts_with("<?xml"), "should write the declaration");
    assert!(stdout.contains("<data>AP8Q</data>"));
}
