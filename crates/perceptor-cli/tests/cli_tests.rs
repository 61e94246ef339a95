//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn perceptor() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("perceptor").unwrap()
}

const MOCK_CONFIG: &str = r#"
quick_provider = "mock"

[providers.mock]
type = "mock"
response = "Acme is a tool that allows users to manage tasks.\n- feature one\n- feature two"
json_response = '{"summary":"Acme reads as a task manager.","detectedGaps":["Pricing is unclear"],"recommendations":[{"title":"Publish pricing","description":"Add a public pricing page.","priority":"high","category":"pricing"}],"questionAnalysis":[{"questionIndex":0,"scores":{"accuracy":0.9,"featureCoverage":0.8,"differentiationClarity":0.4},"risks":["missing features"]}],"overallScore":0.7}'

[[models]]
id = "mock-a"
name = "Mock A"
provider = "mock"

[[models]]
id = "mock-b"
name = "Mock B"
provider = "mock"

[[models]]
id = "mock-off"
name = "Mock Off"
provider = "mock"
enabled = false
"#;

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("perceptor.toml");
    std::fs::write(&path, MOCK_CONFIG).unwrap();
    path
}

fn audit(dir: &Path, config: &Path) -> Command {
    let mut cmd = perceptor();
    cmd.arg("--config")
        .arg(config)
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("audit")
        .arg("--name")
        .arg("Acme")
        .arg("--url")
        .arg("https://acme.dev")
        .arg("--prompts")
        .arg("../../prompts/developer-tools.toml")
        .arg("--output")
        .arg(dir.join("out"));
    cmd
}

fn stored_project_id(dir: &Path) -> String {
    let content = std::fs::read_to_string(dir.join("data/projects.json")).unwrap();
    let projects: serde_json::Value = serde_json::from_str(&content).unwrap();
    projects[0]["id"].as_str().unwrap().to_string()
}

#[test]
fn validate_golden_prompt_set() {
    perceptor()
        .arg("validate")
        .arg("--prompts")
        .arg("../../prompts/golden.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("8 prompts"))
        .stdout(predicate::str::contains("All prompt sets valid"));
}

#[test]
fn validate_directory() {
    perceptor()
        .arg("validate")
        .arg("--prompts")
        .arg("../../prompts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Golden Buyer Questions"))
        .stdout(predicate::str::contains("Developer Tools"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[prompt_set]
id = "bad"
name = "Bad"

[[prompts]]
id = "a"
question = "   "
theme = "Empty"

[[prompts]]
id = "a"
question = "Duplicate?"
theme = "Dup"
"#,
    )
    .unwrap();

    perceptor()
        .arg("validate")
        .arg("--prompts")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[a] WARNING"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    perceptor()
        .arg("validate")
        .arg("--prompts")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    perceptor()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created perceptor.toml"))
        .stdout(predicate::str::contains("Created prompts/golden.toml"));

    assert!(dir.path().join("perceptor.toml").exists());
    assert!(dir.path().join("prompts/golden.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    perceptor()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    perceptor()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn audit_with_mock_provider_saves_and_renders() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    audit(dir.path(), &config)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stderr(predicate::str::contains("5 questions x 2 models, iteration 1"))
        .stderr(predicate::str::contains("Pricing is unclear"));

    let out = dir.path().join("out");
    assert!(out.join("acme-iter1.json").exists());
    assert!(out.join("acme-iter1.html").exists());
    assert!(out.join("acme-iter1.md").exists());

    let json = std::fs::read_to_string(out.join("acme-iter1.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["iteration"], 1);
    assert_eq!(report["question_results"].as_array().unwrap().len(), 5);
    assert_eq!(report["summary"], "Acme reads as a task manager.");
}

#[test]
fn repeated_audits_increment_iteration() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    audit(dir.path(), &config).assert().success();
    audit(dir.path(), &config)
        .assert()
        .success()
        .stderr(predicate::str::contains("iteration 2"));

    let id = stored_project_id(dir.path());

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["reports", "trend", "--project", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme: 2 iteration(s)"));

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["compare", "--project", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Iteration 1 -> 2"));

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"));
}

#[test]
fn audit_rejects_unknown_model() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    audit(dir.path(), &config)
        .arg("--models")
        .arg("gpt-9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown model 'gpt-9'"));
}

#[test]
fn project_delete_removes_reports() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    audit(dir.path(), &config).assert().success();
    let id = stored_project_id(dir.path());

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["project", "delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 report(s)"));

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["reports", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reports found"));
}

#[test]
fn deleting_unknown_report_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    perceptor()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .args(["reports", "delete", "00000000-0000-0000-0000-000000000042"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("report not found"))
        .stdout(predicate::str::contains("Deleted report").not());
}

#[test]
fn quick_prints_camel_case_summary() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    perceptor()
        .arg("--config")
        .arg(&config)
        .args(["quick", "--name", "Acme", "--url", "https://acme.dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"runId\""))
        .stdout(predicate::str::contains("\"questionResponses\""))
        .stdout(predicate::str::contains("\"overallScore\": 0.7"));
}

#[test]
fn quick_with_unconfigured_provider_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    perceptor()
        .arg("--config")
        .arg(&config)
        .args(["quick", "--name", "Acme", "--url", "https://acme.dev", "--provider", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'nope' is not configured"));
}

#[test]
fn compare_report_files() {
    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("baseline.json");
    let current_path = dir.path().join("current.json");

    std::fs::write(&baseline_path, make_test_report(1, 0.9)).unwrap();
    std::fs::write(&current_path, make_test_report(2, 0.3)).unwrap();

    perceptor()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 regressions"));

    perceptor()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .arg("--fail-on-regression")
        .assert()
        .failure();
}

#[test]
fn compare_nonexistent_report() {
    perceptor()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    perceptor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Audit how LLMs perceive your product"));
}

#[test]
fn version_output() {
    perceptor()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("perceptor"));
}

/// A minimal report JSON with one (theme, model) pair.
fn make_test_report(iteration: u32, score: f64) -> String {
    format!(
        r#"{{
    "id": "00000000-0000-0000-0000-00000000000{iteration}",
    "project_id": "p1",
    "project_name": "Acme",
    "iteration": {iteration},
    "timestamp": "2026-01-01T00:00:00Z",
    "overall_score": {score},
    "model_scores": [],
    "question_results": [{{
        "question_id": "1",
        "question": "What is this product?",
        "theme": "Core Positioning",
        "model_responses": [{{
            "model_id": "mock-a",
            "model_name": "Mock A",
            "response": "Acme is a planner.",
            "score": {score},
            "scores": {{
                "accuracy": {score},
                "feature_coverage": {score},
                "differentiation_clarity": {score}
            }}
        }}]
    }}],
    "gaps": [],
    "fixes": [],
    "summary": "",
    "trace_logs": []
}}"#
    )
}
