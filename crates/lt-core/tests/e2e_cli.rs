//! CLI E2E tests for the lt-core binary.
//!
//! Validates:
//! - `analyze` output in table, CSV, and JSON formats
//! - Category filtering and exit codes (0 clean, 1 findings, 10 config)
//! - Rule source resolution (`--rules`, `LT_RULES`, user config, built-in)
//! - `rules`, `categories`, and `check` listings

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

const SAMPLE_LOG: &str = "\
IEF142I PAYROLL STEP1 - STEP WAS EXECUTED - COND CODE 0000
IEC141I 013-18,IFG0194A,PAYROLL,STEP2,INFILE
CEE3207S The system detected a data exception (System Completion Code=0C7).
IEA995I SYMPTOM DUMP OUTPUT  SYSTEM COMPLETION CODE=S0C7
DSNT408I SQLCODE = -911, ERROR: THE CURRENT UNIT OF WORK HAS BEEN ROLLED BACK
";

const CICS_RULES: &str = r#"{
    "schema_version": "1.0.0",
    "description": "CICS only",
    "categories": [{"name": "CICS", "signatures": ["ASRA"]}],
    "rules": [{"signature": "ASRA", "category": "CICS", "remediation": "Program check in transaction."}]
}"#;

/// Get a Command for the lt-core binary isolated from the user's config.
fn lt_core(config_home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("lt-core");
    cmd.timeout(Duration::from_secs(60));
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    cmd.env("HOME", config_home.path());
    cmd.env_remove("LT_RULES");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_log(dir: &Path, content: &str) -> String {
    let path = dir.join("job.log");
    fs::write(&path, content).expect("write log");
    path.to_string_lossy().into_owned()
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run lt-core");
    serde_json::from_slice(&output.stdout).expect("parse JSON")
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn analyze_table_with_findings_exits_one() {
    let home = tempdir().unwrap();
    let log = write_log(home.path(), SAMPLE_LOG);
    lt_core(&home)
        .args(["analyze", log.as_str()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Log"))
        .stdout(predicate::str::contains("COBOL"))
        .stdout(predicate::str::contains("DB2"))
        .stdout(predicate::str::contains("JCL"))
        .stdout(predicate::str::contains("Unknown"));
}

#[test]
fn analyze_reads_stdin() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["--format", "csv", "analyze"])
        .write_stdin("S0C7 abend occurred\n")
        .assert()
        .code(1)
        .stdout(
            "Log,Category,Fix\n\
             S0C7 abend occurred,COBOL,Data exception — check numeric fields or uninitialized variables.\n",
        );
}

#[test]
fn analyze_unmatched_only_exits_zero() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["analyze", "-"])
        .write_stdin("random unmatched text\n")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No known fix. Manual check required."));
}

#[test]
fn analyze_json_envelope() {
    let home = tempdir().unwrap();
    let log = write_log(home.path(), SAMPLE_LOG);
    let json = stdout_json(lt_core(&home).args(["--format", "json", "analyze", log.as_str()]));

    assert_eq!(json["schema_version"], "1.0.0");
    assert_eq!(json["total_lines"], 5);
    assert_eq!(json["rules_source"]["kind"], "builtin");
    assert_eq!(json["rules_fingerprint"].as_str().unwrap().len(), 64);
    assert!(json["run_id"].as_str().is_some());

    let records = json["records"].as_array().unwrap();
    let categories: Vec<&str> = records
        .iter()
        .map(|r| r["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["Unknown", "JCL", "Unknown", "COBOL", "DB2"]);

    let summary = json["summary"].as_array().unwrap();
    assert_eq!(summary[0]["category"], "Unknown");
    assert_eq!(summary[0]["count"], 2);
}

#[test]
fn analyze_category_filter_drops_other_lines() {
    let home = tempdir().unwrap();
    let json = stdout_json(
        lt_core(&home)
            .args(["--format", "json", "analyze", "--category", "JCL"])
            .write_stdin("IEC141I open failed\nS0C4 protection error\n"),
    );
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["line"], "IEC141I open failed");
    assert_eq!(json["active_categories"][0], "JCL");
    assert_eq!(json["total_lines"], 2);
}

#[test]
fn analyze_filter_with_no_hits_exits_zero() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["analyze", "-c", "DB2"])
        .write_stdin("S0C7\nplain\n")
        .assert()
        .code(0)
        .stdout("No matching log lines.\n");
}

#[test]
fn analyze_unknown_category_exits_ten() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["analyze", "-c", "CICS"])
        .write_stdin("S0C7\n")
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unrecognized category 'CICS'"));
}

#[test]
fn analyze_unknown_category_json_error() {
    let home = tempdir().unwrap();
    let output = lt_core(&home)
        .args(["--format", "json", "analyze", "-c", "CICS"])
        .write_stdin("S0C7\n")
        .assert()
        .code(10)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("parse JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["exit_code"], 10);
}

#[test]
fn analyze_missing_file_exits_thirteen() {
    let home = tempdir().unwrap();
    let missing = home.path().join("absent.log");
    lt_core(&home)
        .args(["analyze", missing.to_str().unwrap()])
        .assert()
        .code(13)
        .stderr(predicate::str::contains("absent.log"));
}

#[test]
fn analyze_invalid_utf8_exits_fourteen() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["analyze"])
        .write_stdin(vec![0x53u8, 0x30, 0x43, 0x37, 0xff, b'\n'])
        .assert()
        .code(14)
        .stderr(predicate::str::contains("UTF-8"));
}

#[test]
fn analyze_chart_and_output_file() {
    let home = tempdir().unwrap();
    let log = write_log(home.path(), SAMPLE_LOG);
    lt_core(&home)
        .args(["analyze", "--chart", log.as_str()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error Categories Found"));

    let csv_path = home.path().join("log_analysis.csv");
    lt_core(&home)
        .args(["--format", "csv", "analyze", log.as_str(), "--output"])
        .arg(&csv_path)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("Log,Category,Fix\n"));
    assert_eq!(csv.lines().count(), 6);
    // Commas inside log lines force quoting.
    assert!(csv.contains("\"IEC141I 013-18,IFG0194A,PAYROLL,STEP2,INFILE\",JCL,"));
}

// ============================================================================
// Rule sources
// ============================================================================

#[test]
fn explicit_rules_file_replaces_builtin() {
    let home = tempdir().unwrap();
    let rules = home.path().join("cics.json");
    fs::write(&rules, CICS_RULES).unwrap();

    let json = stdout_json(
        lt_core(&home)
            .args(["--format", "json", "--rules"])
            .arg(&rules)
            .args(["analyze"])
            .write_stdin("DFHAP0001 ASRA abend\nS0C7\n"),
    );
    let records = json["records"].as_array().unwrap();
    assert_eq!(records[0]["category"], "CICS");
    // Built-in signatures are gone.
    assert_eq!(records[1]["category"], "Unknown");
    assert_eq!(json["rules_source"]["kind"], "explicit");
}

#[test]
fn rules_env_var_is_honored() {
    let home = tempdir().unwrap();
    let rules = home.path().join("cics.json");
    fs::write(&rules, CICS_RULES).unwrap();

    lt_core(&home)
        .env("LT_RULES", &rules)
        .args(["categories"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CICS"))
        .stdout(predicate::str::contains("COBOL").not());
}

#[test]
#[cfg(target_os = "linux")]
fn user_config_rules_are_picked_up() {
    let home = tempdir().unwrap();
    let dir = home.path().join("log_triage");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("rules.json"), CICS_RULES).unwrap();

    let json = stdout_json(lt_core(&home).args(["--format", "json", "check"]));
    assert_eq!(json["status"], "ok");
    assert_eq!(json["rules_source"]["kind"], "user_config");
    assert_eq!(json["rules"], 1);
}

#[test]
fn inconsistent_rules_file_exits_ten() {
    let home = tempdir().unwrap();
    let rules = home.path().join("bad.json");
    fs::write(
        &rules,
        r#"{
            "schema_version": "1.0.0",
            "categories": [{"name": "JCL", "signatures": ["IEC141I", "IEB3270E"]}],
            "rules": [{"signature": "IEC141I", "category": "JCL", "remediation": "Open error."}]
        }"#,
    )
    .unwrap();

    lt_core(&home)
        .args(["--rules"])
        .arg(&rules)
        .args(["check"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("IEB3270E"));
}

#[test]
fn missing_explicit_rules_file_exits_ten() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["--rules", "/nonexistent/rules.json", "check"])
        .assert()
        .code(10);
}

// ============================================================================
// Listings
// ============================================================================

#[test]
fn rules_listing_in_precedence_order() {
    let home = tempdir().unwrap();
    let json = stdout_json(lt_core(&home).args(["--format", "json", "rules"]));
    let sigs: Vec<&str> = json["rules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["signature"].as_str().unwrap())
        .collect();
    assert_eq!(
        sigs,
        vec!["S0C7", "S0C4", "SQLCODE = -911", "IGD17272I", "IGD104I", "IEC141I", "IEB3270E"]
    );
}

#[test]
fn rules_listing_for_category() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["rules", "--category", "SMS/Storage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IGD17272I"))
        .stdout(predicate::str::contains("IGD104I"))
        .stdout(predicate::str::contains("S0C7").not());
}

#[test]
fn check_builtin_ok() {
    let home = tempdir().unwrap();
    lt_core(&home)
        .args(["check"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok: 7 rules in 4 categories"));
}
