//! CLI integration tests: run the binary against a small document tree.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("source.md"),
        "[a](x.md#Setup) and [b](x.md#Setup) and [c](y.md)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("x.md"),
        "# X\n\n## Setup\n\nsetup text\n\n## Other\n\nother text\n",
    )
    .unwrap();
    fs::write(dir.path().join("y.md"), "# Y\n\nbody\n").unwrap();
    dir
}

#[test]
fn validate_reports_summary_counts() {
    let dir = fixture();
    Command::cargo_bin("xref")
        .unwrap()
        .args(["validate", dir.path().join("source.md").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 links"))
        .stdout(predicate::str::contains("3 valid"));
}

#[test]
fn validate_flags_broken_links_and_fails_without_any_valid_one() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("source.md"), "[broken](gone.md)\n").unwrap();

    Command::cargo_bin("xref")
        .unwrap()
        .args(["validate", dir.path().join("source.md").to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error"))
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn extract_deduplicates_and_reports_stats() {
    let dir = fixture();
    Command::cargo_bin("xref")
        .unwrap()
        .args(["extract", dir.path().join("source.md").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unique blocks"))
        .stdout(predicate::str::contains("1 duplicates"));
}

#[test]
fn extract_json_has_the_wire_shape() {
    let dir = fixture();
    let output = Command::cargo_bin("xref")
        .unwrap()
        .args([
            "extract",
            dir.path().join("source.md").to_str().unwrap(),
            "--format",
            "json",
            "--whole-files",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(json["contentBlocks"]["_totalCharacterLength"].is_number());
    assert!(json["report"]["processedLinks"].is_array());
    assert_eq!(json["stats"]["totalLinks"], 3);
    // Whole-file flag makes y.md extractable too.
    assert_eq!(json["stats"]["uniqueContent"], 2);
}

#[test]
fn missing_source_document_is_fatal() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("xref")
        .unwrap()
        .args(["validate", dir.path().join("absent.md").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read source document"));
}
