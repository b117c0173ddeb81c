use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

const TALENTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Talents>
  <Talent>
    <Key>GRIT</Key>
    <Name>Grit</Name>
    <Description>Gain +1 strain threshold.</Description>
    <Source Page="139">Edge of the Empire Core Rulebook</Source>
    <Ranked>true</Ranked>
    <ActivationValue>taPassive</ActivationValue>
  </Talent>
  <Talent>
    <Key>BODGUA</Key>
    <Name>Bodyguard</Name>
    <Description>Guard an engaged ally.</Description>
    <Source>Age of Rebellion Core Rulebook</Source>
    <Ranked>true</Ranked>
    <ActivationValue>taManeuver</ActivationValue>
  </Talent>
</Talents>"#;

const RIVALS: &str = r#"[
  {
    "name": "Dock Boss",
    "type": "Rival",
    "characteristics": { "Brawn": 3, "Agility": 2, "Intellect": 2, "Cunning": 3, "Willpower": 2, "Presence": 2 },
    "derived": { "wounds": 14, "soak": 4 },
    "skills": { "Coercion": 2 },
    "gear": ["Heavy clothing (+1 soak)"],
    "tags": ["book:eote"]
  }
]"#;

fn fixture() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "DataCustom/Talents.xml", TALENTS);
    write(dir.path(), "Adversaries/underworld.json", RIVALS);
    dir
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, text).expect("write fixture");
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_holocron"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run holocron CLI")
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn cli_prints_converted_records_as_json() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&["--json", "--campaign", "camp-7", &root]);
    let value = stdout_json(&output);
    let records = value.as_array().expect("array of records");
    assert_eq!(records.len(), 3);

    let grit = records
        .iter()
        .find(|r| r["name"] == "Grit")
        .expect("Grit converted");
    assert_eq!(grit["recordType"], "talents");
    assert_eq!(grit["campaignId"], "camp-7");
    assert_eq!(grit["category"], "Edge of the Empire Core Rulebook");

    let boss = records
        .iter()
        .find(|r| r["name"] == "Dock Boss")
        .expect("Dock Boss converted");
    assert_eq!(boss["recordType"], "npcs");
    assert_eq!(boss["data"]["type"], "rival");
    assert_eq!(boss["data"]["woundThreshold"], 14);
}

#[test]
fn cli_filters_by_source_and_type() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&["--json", "--source", "book:aor", "--type", "talents", &root]);
    let value = stdout_json(&output);
    let records = value.as_array().expect("array of records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Bodyguard");
    assert_eq!(records[0]["category"], "Age of Rebellion Core Rulebook");
}

#[test]
fn cli_counts_mode_reports_scan_summary() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&["--counts", "--json", &root]);
    let value = stdout_json(&output);
    assert_eq!(value["files_seen"], 2);
    assert_eq!(value["total"], 3);
    assert_eq!(value["counts"]["talents"], 2);
    assert_eq!(value["counts"]["npcs"], 1);
    assert_eq!(value["counts"]["items"], 0);
}

#[test]
fn cli_text_summary_lists_records() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&[&root]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Files scanned: 2"));
    assert!(stdout.contains("Dock Boss"));
    assert!(stdout.contains("Bodyguard"));
}

#[test]
fn cli_writes_records_to_output_file() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let out_dir = tempfile::tempdir().expect("tempdir");
    let out_path = out_dir.path().join("records.json");
    let out = out_path.to_string_lossy().to_string();

    let output = run_cli(&["--max-per-type", "1", "--output", &out, &root]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote 2 records to"));

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&out_path).expect("read output")).expect("json");
    assert_eq!(written.as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_summary_lists_unresolved_talents() {
    let dir = fixture();
    write(
        dir.path(),
        "Adversaries/odd.json",
        r#"{"name": "Odd Hermit", "type": "Rival", "talents": ["Mystery Knack"], "tags": ["book:eote"]}"#,
    );
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&[&root]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Problems: 1"));
    assert!(stdout.contains("MissingReference: Odd Hermit: talent 'Mystery Knack'"));
}

#[test]
fn cli_rejects_unknown_source_key() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let output = run_cli(&["--source", "book:nope", &root]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("book:nope"));
}

#[test]
fn cli_reports_missing_root() {
    let output = run_cli(&["/definitely/not/a/holocron/root"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: failed to scan"));
}

#[test]
fn cli_loads_custom_source_catalog() {
    let dir = fixture();
    let root = dir.path().to_string_lossy().to_string();
    let catalog_dir = tempfile::tempdir().expect("tempdir");
    let catalog = catalog_dir.path().join("sources.json");
    fs::write(
        &catalog,
        r#"{"sources": [{"key": "home", "name": "Homebrew", "oggdude_sources": ["Edge of the Empire Core Rulebook"]}]}"#,
    )
    .expect("write catalog");
    let catalog = catalog.to_string_lossy().to_string();

    let output = run_cli(&["--json", "--sources-file", &catalog, "--source", "home", &root]);
    let value = stdout_json(&output);
    let records = value.as_array().expect("array of records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Grit");
    assert_eq!(records[0]["category"], "Homebrew");
}
