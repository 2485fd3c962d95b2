//! Integration tests for apkanalyzer-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use apkanalyzer_core::test_utils::write_test_apk;
use apkanalyzer_core::test_utils::write_test_zip;
use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn apkanalyzer_cmd() -> Command {
    cargo_bin_cmd!("apkanalyzer")
}

fn fixture_apk(temp: &TempDir) -> PathBuf {
    write_test_apk(temp.path(), "app.apk")
}

#[test]
fn test_version_flag() {
    apkanalyzer_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("apkanalyzer"));
}

#[test]
fn test_help_flag() {
    apkanalyzer_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Subject must be one of:"))
        .stdout(predicate::str::contains("[global options] <subject> <verb>"));
}

#[test]
fn test_no_arguments_fails_with_catalogue() {
    apkanalyzer_cmd()
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Subject must be one of: apk, manifest, resources, files",
        ))
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_subject_only_lists_verbs() {
    apkanalyzer_cmd()
        .arg("manifest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Verb must be one of: print, application-id"))
        .stderr(predicate::str::contains("manifest debuggable:"));
}

#[test]
fn test_missing_apk_argument() {
    apkanalyzer_cmd()
        .args(["manifest", "print"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: You must specify an apk file."));
}

#[test]
fn test_apk_summary() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["apk", "summary"])
        .arg(&apk)
        .assert()
        .success()
        .stdout("com.example\t7\t1.0\n");
}

#[test]
fn test_apk_summary_uppercase_extension() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = write_test_apk(temp.path(), "APP.APK");

    apkanalyzer_cmd()
        .args(["apk", "summary"])
        .arg(&apk)
        .assert()
        .success()
        .stdout("com.example\t7\t1.0\n");
}

#[test]
fn test_manifest_print() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["manifest", "print"])
        .arg(&apk)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("android:minSdkVersion=\"21\""));
}

#[test]
fn test_manifest_fields() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    for (verb, expected) in [
        ("application-id", "com.example\n"),
        ("version-name", "1.0\n"),
        ("version-code", "7\n"),
        ("min-sdk", "21\n"),
        ("target-sdk", "33\n"),
        ("debuggable", "false\n"),
    ] {
        apkanalyzer_cmd()
            .args(["manifest", verb])
            .arg(&apk)
            .assert()
            .success()
            .stdout(expected);
    }
}

#[test]
fn test_resources_xml() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["resources", "xml", "--file", "/res/layout/main.xml"])
        .arg(&apk)
        .assert()
        .success()
        .stdout(predicate::str::contains("<LinearLayout"))
        .stdout(predicate::str::contains("android:text=\"@0x7f0b0001\""));
}

#[test]
fn test_resources_xml_rejects_plain_file() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["resources", "xml", "--file", "assets/readme.txt"])
        .arg(&apk)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "ERROR: The supplied file is not a binary XML resource.",
        ));
}

#[test]
fn test_files_list() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["files", "list"])
        .arg(&apk)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/\n/AndroidManifest.xml\n"))
        .stdout(predicate::str::contains("/res/layout/\n"));
}

#[test]
fn test_files_cat() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["files", "cat", "--file", "assets/readme.txt"])
        .arg(&apk)
        .assert()
        .success()
        .stdout("hello apk\n");
}

#[test]
fn test_files_cat_missing_entry() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["files", "cat", "--file", "assets/nope.txt"])
        .arg(&apk)
        .assert()
        .failure()
        .stderr(predicate::str::contains("assets/nope.txt"));
}

#[test]
fn test_generic_zip_lists_files() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let jar = write_test_zip(
        temp.path(),
        "lib.jar",
        &[("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".as_slice())],
    );

    apkanalyzer_cmd()
        .args(["files", "list"])
        .arg(&jar)
        .assert()
        .success()
        .stdout("/\n/META-INF/\n/META-INF/MANIFEST.MF\n");
}

#[test]
fn test_app_bundle_unsupported() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let bundle = write_test_zip(temp.path(), "app.aab", &[("a.txt", b"a".as_slice())]);

    apkanalyzer_cmd()
        .args(["apk", "summary"])
        .arg(&bundle)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: Unsupported archive"));
}

#[test]
fn test_nonexistent_archive() {
    apkanalyzer_cmd()
        .args(["apk", "summary", "/nonexistent/app.apk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: File not found"));
}

#[test]
fn test_verbose_logging_on_stderr() {
    let temp = TempDir::new().expect("failed to create temp dir");
    let apk = fixture_apk(&temp);

    apkanalyzer_cmd()
        .args(["-vv", "apk", "summary"])
        .arg(&apk)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout("com.example\t7\t1.0\n")
        .stderr(predicate::str::contains("DEBUG"));
}
