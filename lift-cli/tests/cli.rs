use assert_cmd::cargo::cargo_bin_cmd;
use lift_parser::lift::testing::SAMPLE;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("lift-parser")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn sample_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sena.lift");
    fs::write(&path, SAMPLE).expect("write sample");
    path
}

fn lift(args: &[&str], path: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lift");
    cmd.arg(args[0]).arg(path).args(&args[1..]);
    cmd
}

#[test]
fn show_prints_header_and_collated_entries() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["show"], &path).assert().success().stdout(
        predicate::str::contains("LIFT lexicon v0.13; produced by SIL.FLEx 8.3.12")
            .and(predicate::str::contains("3 entries, 2 ranges"))
            .and(predicate::str::contains("house"))
            .and(predicate::str::is_match("(?s)èmbe.*nyumba.*pëpe").expect("regex")),
    );
}

#[test]
fn show_uses_configured_gloss_language() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    let config = dir.path().join("lift.toml");
    fs::write(&config, "[display]\ngloss_language = \"pt\"\n").expect("write config");
    lift(&["show"], &path)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("casa"));
}

#[test]
fn show_picks_up_project_config_and_set_overrides() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    fs::write(
        dir.path().join("lift.toml"),
        "[display]\ngloss_language = \"pt\"\n",
    )
    .expect("write config");
    lift(&["show"], &path)
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("casa"));
    lift(&["show"], &path)
        .current_dir(dir.path())
        .arg("--set")
        .arg("display.gloss_language=en")
        .assert()
        .success()
        .stdout(predicate::str::contains("house").and(predicate::str::contains("casa").not()));
}

#[test]
fn malformed_set_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["show"], &path)
        .arg("--set")
        .arg("display.gloss_language")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected KEY=VALUE"));
}

#[test]
fn check_reports_clean_sample() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["check"], &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("no problems found"));
}

#[test]
fn check_json_lists_findings() {
    let output = lift(&["check", "--json"], &fixture_path("tolerant.lift"))
        .output()
        .expect("runs");
    assert!(output.status.success());
    let findings: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let kinds: Vec<_> = findings
        .as_array()
        .expect("an array")
        .iter()
        .filter_map(|finding| finding["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"malformed-value"));
    assert_eq!(
        kinds.iter().filter(|kind| **kind == "unresolved-reference").count(),
        2
    );
}

#[test]
fn get_prints_item_markup() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["get", "pepe_s1"], &path)
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("<sense id=\"pepe_s1\"")
                .and(predicate::str::contains("<text>house</text>")),
        );
    lift(&["get", "embe_s1.1", "--parent"], &path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<sense id=\"embe_s1\""));
}

#[test]
fn get_unknown_id_fails() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["get", "nope"], &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no item with id 'nope'"));
}

#[test]
fn find_by_gloss_and_by_regex() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["find", "hou"], &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("pepe_s1"));
    lift(
        &["find", "^ny", "--field", "lexical-unit", "--match", "regex"],
        &path,
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("nyumba_1"));
    lift(&["find", "Noun", "--field", "grammatical-info", "--all"], &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("pepe_s1").and(predicate::str::contains("nyumba_s1")));
}

#[test]
fn find_without_match_fails() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    lift(&["find", "zebra"], &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No match for 'zebra'"));
    lift(&["find", "x", "--match", "fuzzy"], &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown match kind 'fuzzy'"));
}

#[test]
fn convert_writes_requested_version() {
    let dir = TempDir::new().expect("temp dir");
    let path = sample_file(&dir);
    let output = dir.path().join("converted.xml");
    lift(&["convert", "--to-version", "0.15", "--output"], &path)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("LIFT 0.15"));
    let written = fs::read_to_string(dir.path().join("converted.lift")).expect("written");
    assert!(written.contains("version=\"0.15\""));
    assert!(written.contains("producer=\"lift-utils "));
}

#[test]
fn schema_describes_elements() {
    cargo_bin_cmd!("lift")
        .args(["schema", "field", "--version", "0.15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name").and(predicate::str::contains("(required)")));
    cargo_bin_cmd!("lift")
        .args(["schema", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown element 'bogus'"));
}

#[test]
fn missing_file_fails_with_message() {
    lift(&["show"], Path::new("/nonexistent/sena.lift"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot load"));
}
