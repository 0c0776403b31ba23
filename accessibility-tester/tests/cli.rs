use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "accessibility-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_accessibility-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("persistence-reload"));
}

#[test]
fn cli_runs_logic_scenarios_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_accessibility-tester");
    let output_path = temp_path("logic");
    let status = Command::new(exe)
        .args([
            "--scenarios",
            "smoke,reset-all",
            "--seeds",
            "7,0x2a",
            "--iterations",
            "2",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let json_end = content.rfind(']').expect("json array");
    let results: serde_json::Value =
        serde_json::from_str(&content[..=json_end]).expect("parse report");
    let results = results.as_array().expect("array");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_rejects_unknown_browser() {
    let exe = env!("CARGO_BIN_EXE_accessibility-tester");
    let output = Command::new(exe)
        .args(["--mode", "browser", "--browsers", "chrome,lynx"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lynx"));
}

#[test]
fn cli_rejects_unknown_scenario_before_running() {
    let exe = env!("CARGO_BIN_EXE_accessibility-tester");
    let output_path = temp_path("unknown");
    let output = Command::new(exe)
        .args(["--scenarios", "smoke,reading-guide", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario: reading-guide"));
    assert!(!output_path.exists());
}

#[test]
fn cli_rejects_unrecognised_seeds() {
    let exe = env!("CARGO_BIN_EXE_accessibility-tester");
    let status = Command::new(exe)
        .args(["--seeds", "not-a-seed", "--report", "json"])
        .status()
        .expect("run cli");
    assert!(!status.success());
}
