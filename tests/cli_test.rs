//! Integration tests for the glycorisk binary

use assert_cmd::Command;
use predicates::str::contains;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    /// Binary with config and data directories isolated under the temp dir.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("glycorisk").expect("binary built");
        cmd.env("HOME", self.tmp.path())
            .env("XDG_CONFIG_HOME", self.tmp.path().join("config"))
            .env("XDG_DATA_HOME", self.tmp.path().join("data"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn exports(&self) -> PathBuf {
        self.tmp.path().join("exports")
    }
}

fn artifact(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("artifacts")
        .join(name)
}

fn assess_args(glucose: Option<&str>) -> Vec<String> {
    assess_args_with_model(glucose, &artifact("diabetes_risk_model.json"))
}

fn assess_args_with_model(glucose: Option<&str>, model: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "assess",
        "--user-id",
        "u-1",
        "--name",
        "Alex",
        "--age",
        "42",
        "--weight",
        "75.5",
        "--height",
        "175",
        "--activity",
        "45",
        "--diet",
        "healthy",
        "--adherence",
        "good",
        "--stress",
        "low",
        "--sleep",
        "8",
        "--hydration",
        "yes",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if let Some(glucose) = glucose {
        args.push("--glucose".to_string());
        args.push(glucose.to_string());
    }

    args.push("--model".to_string());
    args.push(model.display().to_string());
    args.push("--scaler".to_string());
    args.push(artifact("scaler.json").display().to_string());
    args
}

#[test]
fn disclaimer_prints() {
    TestEnv::new()
        .cmd()
        .arg("disclaimer")
        .assert()
        .success()
        .stdout(contains("NOT a medical diagnosis"));
}

#[test]
fn assess_reports_risk_level() {
    TestEnv::new()
        .cmd()
        .args(assess_args(Some("120")))
        .assert()
        .success()
        .stdout(contains("Risk level: Low"))
        .stdout(contains("Recommendations"));
}

#[test]
fn assess_json_output() {
    let output = TestEnv::new()
        .cmd()
        .args(assess_args(Some("120")))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["category"], "Low");
    assert_eq!(value["recommendations"].as_array().unwrap().len(), 8);
}

#[test]
fn assess_missing_glucose_fails_with_field_name() {
    TestEnv::new()
        .cmd()
        .args(assess_args(None))
        .assert()
        .code(2)
        .stderr(contains("glucose"));
}

#[test]
fn assess_missing_model_fails() {
    TestEnv::new()
        .cmd()
        .args(assess_args_with_model(
            Some("120"),
            Path::new("/nonexistent/model.json"),
        ))
        .assert()
        .code(1)
        .stderr(contains("Risk model unavailable"));
}

#[test]
fn assess_writes_export() {
    let env = TestEnv::new();
    env.cmd()
        .args(assess_args(Some("200")))
        .arg("--output")
        .arg(env.exports())
        .assert()
        .success()
        .stdout(contains("Exported to"));

    let files: Vec<_> = std::fs::read_dir(env.exports())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("assessment_u-1_"));
}

#[test]
fn config_rejects_unknown_timezone() {
    TestEnv::new()
        .cmd()
        .args(["config", "--timezone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(contains("Mars/Olympus"));
}

#[test]
fn status_without_history() {
    TestEnv::new()
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("No previous session data found"));
}

fn wizard_cmd(env: &TestEnv) -> Command {
    let mut cmd = env.cmd();
    cmd.arg("wizard")
        .arg("--model")
        .arg(artifact("diabetes_risk_model.json"))
        .arg("--scaler")
        .arg(artifact("scaler.json"));
    cmd
}

const PROFILE_ANSWERS: &str = "u-1\nAlex\n42\n75.5\n175\n";

#[test]
fn wizard_asks_again_only_for_rejected_field() {
    let env = TestEnv::new();
    let answers = format!(
        "{PROFILE_ANSWERS}abc\n45\nhealthy\ngood\nlow\n8\nyes\n120\nn\nq\n"
    );

    let output = wizard_cmd(&env).write_stdin(answers).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("glucose"), "stderr: {stderr}");
    assert_eq!(stdout.matches("Blood glucose (mg/dL):").count(), 2);
    assert_eq!(stdout.matches("Physical activity (minutes):").count(), 1);
    assert_eq!(stdout.matches("Sleep (hours):").count(), 1);
    assert!(stdout.contains("Risk level: Low"));
    assert!(stdout.contains("Rejected submissions: 1"));
}

#[test]
fn wizard_new_entry_exports_twice() {
    let env = TestEnv::new();
    env.cmd()
        .args(["config", "--export-dir"])
        .arg(env.exports())
        .assert()
        .success();

    let daily = "120\n45\nhealthy\ngood\nlow\n8\nyes\n";
    let answers = format!("{PROFILE_ANSWERS}{daily}y\nn\n{daily}y\nq\n");

    wizard_cmd(&env)
        .write_stdin(answers)
        .assert()
        .success()
        .stdout(contains("Exports written: 2"));

    let count = std::fs::read_dir(env.exports()).unwrap().count();
    assert_eq!(count, 2);
}

#[test]
fn wizard_end_of_input_exits_cleanly() {
    let env = TestEnv::new();
    wizard_cmd(&env)
        .write_stdin("u-1\nAlex\n")
        .assert()
        .success()
        .stdout(contains("Assessments computed: 0"));
}

#[test]
fn status_reports_previous_assessments() {
    let env = TestEnv::new();
    env.cmd()
        .args(assess_args(Some("120")))
        .assert()
        .success();

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Assessments computed: 1"));
}
