use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Binary pointed at the fixture tables and config, isolated from the user's environment.
fn explorer() -> Command {
    let mut cmd = cargo_bin_cmd!();
    cmd.env_remove("BABYNAMES_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(fixtures_dir().join("config.toml"))
        .arg("--data-dir")
        .arg(fixtures_dir());
    cmd
}

#[test]
fn test_help_flag() {
    cargo_bin_cmd!()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("baby name popularity"));
}

#[test]
fn test_trend_sums_states_for_all() {
    explorer()
        .args(["trend", "--name", "Emma", "--years", "2000-2001"])
        .args(["--state", "All", "--gender", "female", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::eq(
            "year,name,gender,state,count\n2000,Emma,F,ALL,200\n2001,Emma,F,ALL,130\n",
        ));
}

#[test]
fn test_trend_uses_configured_defaults() {
    explorer()
        .arg("trend")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: CA | Gender: Both"))
        .stdout(predicate::str::contains("| 2000 | 125 |"))
        .stdout(predicate::str::contains("| 2001 | 130 |"));
}

#[test]
fn test_trend_rejects_more_than_three_names() {
    explorer()
        .args(["trend", "--name", "Emma", "--name", "Emily"])
        .args(["--name", "Jacob", "--name", "Michael"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("select up to 3 names"));
}

#[test]
fn test_trend_rejects_inverted_year_range() {
    explorer()
        .args(["trend", "--years", "2010-2000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid year range"));
}

#[test]
fn test_trend_without_matches_reports_no_data() {
    explorer()
        .args(["trend", "--name", "Zelda"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No data available for selected filters."));
}

#[test]
fn test_map_outputs_state_totals_as_json() {
    let output = explorer()
        .args(["map", "--name", "Emma", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["state"], "CA");
    assert_eq!(value[0]["count"], 255);
    assert_eq!(value[1]["state"], "NY");
    assert_eq!(value[1]["count"], 80);
}

#[test]
fn test_top_national_is_padded_to_fifty_rows() {
    let output = explorer()
        .args(["top", "--year", "2000", "--format", "csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 51);
    assert_eq!(lines[1], "1,Michael,170,Emily,250");
    assert_eq!(lines[2], "2,Jacob,150,Emma,200");
    assert_eq!(lines[3], "3,Emma,5,,");
    assert_eq!(lines[50], "50,,,,");
}

#[test]
fn test_top_state_markdown() {
    explorer()
        .args(["top", "--year", "2000", "--state", "ny"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top 50 names for NY in 2000:"))
        .stdout(predicate::str::contains("| 1 | Michael | 70 | Emily | 110 |"));
}

#[test]
fn test_unisex_defaults_to_latest_year() {
    explorer()
        .arg("unisex")
        .assert()
        .success()
        .stdout(predicate::str::contains("Top Unisex Names for 2000"))
        .stdout(predicate::str::contains("Riley"))
        .stdout(predicate::str::contains("Jordan"))
        .stdout(predicate::str::contains("Peyton").not());
}

#[test]
fn test_unisex_state_without_rows() {
    explorer()
        .args(["unisex", "--year", "2000", "--state", "TX"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No data available for TX in 2000"));
}

#[test]
fn test_catalog_lists_states() {
    explorer()
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("- states: CA NY"))
        .stdout(predicate::str::contains("- state_years: 2000-2001"));
}

#[test]
fn test_out_writes_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("top.md");

    explorer()
        .args(["top", "--year", "2000", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("# Top 50 National Names"));
}

#[test]
fn test_missing_data_dir_fails() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!()
        .env_remove("BABYNAMES_DATA_DIR")
        .arg("--config")
        .arg(fixtures_dir().join("config.toml"))
        .arg("--data-dir")
        .arg(dir.path())
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load the name tables"));
}
