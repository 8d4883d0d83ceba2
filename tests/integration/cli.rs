//! CLI binary smoke tests

use assert_cmd::Command;

#[test]
fn test_help_lists_flags() {
    let output = Command::cargo_bin("gamelog-harvester")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--username",
        "--output-dir",
        "--deadline-secs",
        "--chunk-size",
        "--metrics-addr",
        "--site-backoff",
        "GAMELOG_PAGE_CONCURRENCY",
    ] {
        assert!(help.contains(flag), "missing {flag} in help:\n{help}");
    }
}

#[test]
fn test_missing_credentials_exit_with_setup_code() {
    let dir = tempfile::TempDir::new().unwrap();
    Command::cargo_bin("gamelog-harvester")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("TOKEN")
        .env_remove("CLIENT_ID")
        .args(["--username", "alice"])
        .assert()
        .code(2);
}

#[test]
fn test_chunk_size_out_of_range_is_usage_error() {
    Command::cargo_bin("gamelog-harvester")
        .unwrap()
        .args(["--chunk-size", "0", "--username", "alice"])
        .assert()
        .failure();
}
