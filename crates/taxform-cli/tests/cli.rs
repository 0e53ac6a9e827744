use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const W2_ANALYSIS: &str = r#"{
    "content": "a Employee's social security number\n123-45-6789\n1 Wages, tips, other comp. 900.00\ne Employee's first name and initial\nSAI KUMAR\nLast name\nPOTURI\n1234 ELM STREET\nDALLAS, TX 75201\n",
    "keyValuePairs": [{"key": "Plan", "value": "401k"}]
}"#;

const NEC_ANALYSIS: &str = r#"{
    "content": "Form 1099-NEC",
    "document": {
        "docType": "tax.us.1099NEC",
        "fields": {
            "Box1": {"value": 1500, "confidence": 0.97},
            "Recipient.Name": {"value": "JOHN ROE", "confidence": 0.95}
        }
    }
}"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Command with an empty config file and no provider environment.
fn taxform(dir: &Path) -> Command {
    let config = write(dir, "config.json", "{}");
    let mut cmd = Command::cargo_bin("taxform").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env_remove("TAXFORM_ENDPOINT")
        .env_remove("TAXFORM_API_KEY")
        .env_remove("TAXFORM_API_VERSION");
    cmd
}

#[test]
fn test_process_replays_w2_analysis() {
    let dir = TempDir::new().unwrap();
    let analysis = write(dir.path(), "w2.json", W2_ANALYSIS);

    taxform(dir.path())
        .args(["process", "--type", "w2", "--analysis"])
        .arg(&analysis)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""employeeName": "SAI KUMAR POTURI""#))
        .stdout(predicate::str::contains(r#""wages": 900.0"#))
        .stdout(predicate::str::contains(r#""employeeCity": "DALLAS""#))
        .stdout(predicate::str::contains(r#""Plan": "401k""#))
        .stdout(predicate::str::contains(r#""documentType": "W2""#));
}

#[test]
fn test_process_raw_record_has_no_defaults() {
    let dir = TempDir::new().unwrap();
    let analysis = write(dir.path(), "w2.json", r#"{"content": "nothing here"}"#);

    taxform(dir.path())
        .args(["process", "--type", "w2", "--raw", "--analysis"])
        .arg(&analysis)
        .assert()
        .success()
        .stdout(predicate::str::contains("fullText"))
        .stdout(predicate::str::contains("wages").not())
        .stdout(predicate::str::contains("documentType").not());
}

#[test]
fn test_process_1099_csv_to_file() {
    let dir = TempDir::new().unwrap();
    let analysis = write(dir.path(), "nec.json", NEC_ANALYSIS);
    let output = dir.path().join("nec.csv");

    taxform(dir.path())
        .args(["process", "--type", "1099-nec", "--format", "csv", "--analysis"])
        .arg(&analysis)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.contains("nonemployeeCompensation"));
    assert!(csv.contains("JOHN ROE"));
    assert!(csv.contains("1500.0"));
}

#[test]
fn test_process_without_provider_config_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "w2.pdf", "%PDF-1.4");

    taxform(dir.path())
        .args(["process", "--type", "w2"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider endpoint is not set"));
}

#[test]
fn test_process_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    taxform(dir.path())
        .args(["process", "--type", "w2", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_unknown_document_type_is_rejected() {
    let dir = TempDir::new().unwrap();

    taxform(dir.path())
        .args(["process", "--type", "1040", "--analysis", "x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown document type"));
}

#[test]
fn test_batch_replays_saved_analyses_with_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("inputs");
    let outputs = dir.path().join("outputs");
    fs::create_dir_all(&inputs).unwrap();
    write(&inputs, "first.json", W2_ANALYSIS);
    write(&inputs, "second.json", r#"{"content": "no labels"}"#);

    let pattern = inputs.join("*.json");

    taxform(dir.path())
        .args(["batch", "--type", "w2", "--summary", "--output-dir"])
        .arg(&outputs)
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(outputs.join("first.json").exists());
    assert!(outputs.join("second.json").exists());

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,document_type"));
    assert!(summary.contains("first.json,success,W2,SAI KUMAR POTURI,123-45-6789,900.0"));
}

#[test]
fn test_config_init_and_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("taxform").join("config.json");

    Command::cargo_bin("taxform")
        .unwrap()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    Command::cargo_bin("taxform")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "provider.api_version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-11-30"));
}

#[test]
fn test_config_set_rejects_wrong_type() {
    let dir = TempDir::new().unwrap();

    taxform(dir.path())
        .args(["config", "set", "provider.max_poll_attempts", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}
