//! CLI tests for the `ek-export` binary
//!
//! Drives keygen -> build -> verify -> inspect through the real binary
//! against a temporary working directory.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

fn ek_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ek-export"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ek-export")
}

fn write_inputs(dir: &Path) {
    fs::write(
        dir.join("ek-export.toml"),
        r#"
[logging]
level = "warn"

[[signer]]
key_ref = "sig1"
android_package = "org.example.app"
key_version = "v1"
key_id = "sig1"
"#,
    )
    .unwrap();

    fs::write(
        dir.join("batch.json"),
        json!({
            "start": "2023-01-01T00:00:00Z",
            "end": "2023-01-02T00:00:00Z",
            "region": "AT"
        })
        .to_string(),
    )
    .unwrap();

    // "K2" and "K1" in base64
    fs::write(
        dir.join("exposures.json"),
        json!([
            {"key": "SzI=", "transmission_risk": 5, "rolling_start_interval": 2660, "rolling_period": 144},
            {"key": "SzE=", "transmission_risk": 3}
        ])
        .to_string(),
    )
    .unwrap();
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_keygen_build_verify_inspect() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_inputs(root);
    let key_dir = root.join("keys");
    let archive = root.join("export.zip");

    let out = ek_export(&["keygen", "--key-dir", path_str(&key_dir), "--key-ref", "sig1"]);
    assert!(out.status.success(), "keygen: {}", String::from_utf8_lossy(&out.stderr));
    assert!(key_dir.join("sig1.pem").exists());
    assert!(key_dir.join("sig1.pub.pem").exists());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Fingerprint:"));

    let out = ek_export(&[
        "build",
        "--config",
        path_str(&root.join("ek-export.toml")),
        "--batch",
        path_str(&root.join("batch.json")),
        "--exposures",
        path_str(&root.join("exposures.json")),
        "--out",
        path_str(&archive),
    ]);
    assert!(out.status.success(), "build: {}", String::from_utf8_lossy(&out.stderr));
    assert!(archive.exists());

    let trusted = format!("sig1={}", path_str(&key_dir.join("sig1.pub.pem")));
    let out = ek_export(&["verify", "--archive", path_str(&archive), "--public-key", &trusted, "--json"]);
    assert!(out.status.success(), "verify: {}", String::from_utf8_lossy(&out.stderr));
    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["verified"], true);
    assert_eq!(report["signatures"][0]["key_id"], "sig1");

    let out = ek_export(&["inspect", "--archive", path_str(&archive)]);
    assert!(out.status.success());
    let parsed: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(parsed["region"], "AT");
    assert_eq!(parsed["keys"][0]["key"], "SzE=");
    assert_eq!(parsed["keys"][0]["rolling_period"], Value::Null);
    assert_eq!(parsed["keys"][1]["key"], "SzI=");
    assert_eq!(parsed["keys"][1]["rolling_start_interval_number"], 2660);
    assert_eq!(parsed["start"], "2023-01-01T00:00:00+00:00");
}

#[test]
fn test_verify_fails_with_wrong_key() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_inputs(root);
    let key_dir = root.join("keys");
    let other_dir = root.join("other");
    let archive = root.join("export.zip");

    assert!(ek_export(&["keygen", "--key-dir", path_str(&key_dir), "--key-ref", "sig1"]).status.success());
    assert!(ek_export(&["keygen", "--key-dir", path_str(&other_dir), "--key-ref", "sig1"]).status.success());
    assert!(ek_export(&[
        "build",
        "--config",
        path_str(&root.join("ek-export.toml")),
        "--batch",
        path_str(&root.join("batch.json")),
        "--exposures",
        path_str(&root.join("exposures.json")),
        "--out",
        path_str(&archive),
    ])
    .status
    .success());

    let wrong = format!("sig1={}", path_str(&other_dir.join("sig1.pub.pem")));
    let out = ek_export(&["verify", "--archive", path_str(&archive), "--public-key", &wrong]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("[FAIL] sig1"));
}

#[test]
fn test_build_without_keys_fails() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_inputs(root);
    fs::create_dir(root.join("keys")).unwrap();
    let archive = root.join("export.zip");

    let out = ek_export(&[
        "build",
        "--config",
        path_str(&root.join("ek-export.toml")),
        "--batch",
        path_str(&root.join("batch.json")),
        "--exposures",
        path_str(&root.join("exposures.json")),
        "--out",
        path_str(&archive),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("CRYPTO"));
    assert!(!archive.exists());
}

#[test]
fn test_missing_config_exits_2() {
    let dir = TempDir::new().unwrap();
    let out = ek_export(&[
        "build",
        "--config",
        path_str(&dir.path().join("absent.toml")),
        "--batch",
        "batch.json",
        "--exposures",
        "exposures.json",
        "--out",
        "out.zip",
    ]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_keygen_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let key_dir = dir.path().join("keys");
    assert!(ek_export(&["keygen", "--key-dir", path_str(&key_dir), "--key-ref", "sig1"]).status.success());
    let before = fs::read(key_dir.join("sig1.pem")).unwrap();

    let out = ek_export(&["keygen", "--key-dir", path_str(&key_dir), "--key-ref", "sig1"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(fs::read(key_dir.join("sig1.pem")).unwrap(), before);
}
