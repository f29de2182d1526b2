//! CLI integration tests
//!
//! These tests verify the CLI works correctly by running the binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn xsd2proto_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xsd2proto"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn run(args: &[&str], out: &TempDir) -> Output {
    Command::new(xsd2proto_bin())
        .args(args)
        .arg("--output")
        .arg(out.path())
        .output()
        .expect("Failed to execute command")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_str().unwrap().to_string()
}

// ============================================================================
// Translation
// ============================================================================

#[test]
fn test_cli_single_file() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("simple_element.xsd")], &out);

    assert!(output.status.success(), "translation should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("simple_element.proto"), "should list the written file");

    let proto = fs::read_to_string(out.path().join("simple_element.proto")).unwrap();
    assert!(proto.starts_with("syntax = \"proto2\";\n\npackage ex;\n"));
    assert!(proto.contains("message Name {\n  required string name = 1;\n}\n"));
}

#[test]
fn test_cli_filename_and_package() {
    let out = TempDir::new().unwrap();
    let output = run(
        &[&fixture("color.xsd"), "--filename", "colors.proto", "--package", "paint"],
        &out,
    );

    assert!(output.status.success());
    let proto = fs::read_to_string(out.path().join("colors.proto")).unwrap();
    assert!(proto.contains("package paint;\n"));
    assert!(proto.contains("enum Color {"));
}

#[test]
fn test_cli_protobuf_version_3() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("simple_element.xsd"), "--protobuf-version", "3"], &out);

    assert!(output.status.success());
    let proto = fs::read_to_string(out.path().join("simple_element.proto")).unwrap();
    assert!(proto.starts_with("syntax = \"proto3\";"));
    assert!(proto.contains("  string name = 1;\n"));
}

#[test]
fn test_cli_split_by_namespace() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("orders/orders.xsd"), "--split-by-namespace"], &out);

    assert!(output.status.success());
    let orders = fs::read_to_string(out.path().join("com.example.orders.proto")).unwrap();
    let common = fs::read_to_string(out.path().join("com.example.common.proto")).unwrap();
    assert!(orders.contains("import \"com.example.common.proto\";\n"));
    assert!(orders.contains("required com.example.common.Address ship_to = 6;"));
    assert!(common.contains("message Address {"));
}

#[test]
fn test_cli_config_file() {
    let out = TempDir::new().unwrap();
    let output = run(
        &[&fixture("orders/orders.xsd"), "--config", &fixture("options.toml")],
        &out,
    );

    assert!(output.status.success());
    let proto = fs::read_to_string(out.path().join("orders.proto")).unwrap();
    assert!(proto.starts_with("syntax = \"proto3\";"));
    assert!(proto.contains("import \"google/protobuf/timestamp.proto\";\n"));
    assert!(proto.contains("  google.protobuf.Timestamp placed = 4;\n"));
    assert!(proto.contains("\nenum Status {\n"));
}

#[test]
fn test_cli_flags_override_config() {
    let out = TempDir::new().unwrap();
    let output = run(
        &[
            &fixture("simple_element.xsd"),
            "--config",
            &fixture("options.toml"),
            "--protobuf-version",
            "2",
        ],
        &out,
    );

    assert!(output.status.success());
    let proto = fs::read_to_string(out.path().join("simple_element.proto")).unwrap();
    assert!(proto.starts_with("syntax = \"proto2\";"));
}

#[test]
fn test_cli_dump_registry() {
    let out = TempDir::new().unwrap();
    let dump = out.path().join("registry.json");
    let output = run(
        &[&fixture("color.xsd"), "--dump-registry", dump.to_str().unwrap()],
        &out,
    );

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&dump).unwrap()).unwrap();
    assert!(json["enums"]["Color"].is_object(), "should contain the Color enumeration");
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_cli_missing_type_fails() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("missing.xsd")], &out);

    assert!(!output.status.success(), "missing types should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Ghost"), "should name the missing type");
    assert!(!out.path().join("missing.proto").exists(), "should write nothing");
}

#[test]
fn test_cli_invalid_type_mapping() {
    let out = TempDir::new().unwrap();
    let output = run(
        &[&fixture("simple_element.xsd"), "--type-mapping", "no-separator"],
        &out,
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mapping error"));
}

#[test]
fn test_cli_invalid_protobuf_version() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("simple_element.xsd"), "--protobuf-version", "4"], &out);

    assert!(!output.status.success());
}

#[test]
fn test_cli_missing_input() {
    let out = TempDir::new().unwrap();
    let output = run(&[&fixture("does-not-exist.xsd")], &out);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resource error"));
}
