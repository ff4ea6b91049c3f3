/// Black-box tests of the `venueops` binary.
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn venueops(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("venueops").expect("Failed to find venueops binary");
    cmd.current_dir(dir.path())
        .env_remove("VENUEOPS_JWT__SECRET")
        .env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    venueops(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_migrate_creates_database_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("fresh.db");

    venueops(&dir)
        .arg("migrate")
        .env("VENUEOPS_DATABASE_URL", db_path.to_string_lossy().to_string())
        .assert()
        .success();

    assert!(db_path.exists());
}

#[test]
fn test_migrate_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("from-file.db");
    let config_path = dir.path().join("custom.toml");
    std::fs::write(
        &config_path,
        format!("database_url = \"{}\"\n", db_path.to_string_lossy()),
    )
    .unwrap();

    venueops(&dir)
        .args(["migrate", "--config"])
        .arg(&config_path)
        .assert()
        .success();

    assert!(db_path.exists());
}

#[test]
fn test_serve_without_secret_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("serve.db");

    venueops(&dir)
        .arg("serve")
        .env("VENUEOPS_DATABASE_URL", db_path.to_string_lossy().to_string())
        .env("VENUEOPS_BIND_ADDR", "127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("jwt.secret is required"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("venueops.toml"), "recurrence = 5\n").unwrap();

    venueops(&dir)
        .arg("migrate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}
