use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

/// --help should list every subcommand.
#[test]
fn test_help_lists_subcommands() {
    cargo_bin_cmd!("kwresearch")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("config"));
}

/// Running with no subcommand should fail.
#[test]
fn test_no_args_shows_error() {
    cargo_bin_cmd!("kwresearch").assert().failure();
}

/// The example config should carry the documented defaults.
#[test]
fn test_config_example() {
    cargo_bin_cmd!("kwresearch")
        .args(["config", "example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("language_id = \"1000\""))
        .stdout(predicate::str::contains("batch_size = 20"));
}

/// Values written with `config set` are read back by `config get`.
#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let config_arg = config_path.to_str().unwrap();

    cargo_bin_cmd!("kwresearch")
        .args(["config", "set", "batch_size", "7", "--config", config_arg])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated batch_size = 7"));

    cargo_bin_cmd!("kwresearch")
        .args(["config", "get", "batch_size", "--config", config_arg])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));
}

/// Integer keys can be overridden from the environment.
#[test]
fn test_env_integer_override() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("kwresearch")
        .args(["config", "get", "batch_size", "--config"])
        .arg(dir.path().join("config.toml"))
        .env("KWR_BATCH_SIZE", "10")
        .assert()
        .success()
        .stdout(predicate::str::diff("10\n"));
}

/// A rejected value is not written to the config file.
#[test]
fn test_config_set_rejects_invalid_value() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("kwresearch")
        .args(["config", "set", "page_size", "-1", "--config"])
        .arg(&config_path)
        .assert()
        .failure();

    cargo_bin_cmd!("kwresearch")
        .args(["config", "show", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("page_size: 1"));
}

/// Unknown keys are rejected with the list of valid keys.
#[test]
fn test_config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("kwresearch")
        .args(["config", "get", "database_path", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

/// A missing credentials file stops the run before any request is made.
#[test]
fn test_run_missing_credentials_fails() {
    let dir = TempDir::new().unwrap();
    let mut input = std::fs::File::create(dir.path().join("domain.txt")).unwrap();
    writeln!(input, "shoe").unwrap();

    cargo_bin_cmd!("kwresearch")
        .current_dir(dir.path())
        .args(["run", "--customer-id", "123-456-7890", "--credentials", "missing.yaml"])
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load Google Ads credentials"));

    assert!(!dir.path().join("failed_keywords.txt").exists());
}

/// Without a customer id the run refuses to start.
#[test]
fn test_run_requires_customer_id() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("kwresearch")
        .current_dir(dir.path())
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .env_remove("KWR_CUSTOMER_ID")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No customer id configured"));
}
