use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn stackrig() -> Command {
    Command::cargo_bin("stackrig").unwrap()
}

fn project(config_toml: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("stackrig.toml");
    std::fs::write(&config_path, config_toml).unwrap();
    (dir, config_path)
}

fn write_script(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), format!("#!/bin/sh\n{body}\n")).unwrap();
}

/// A port nothing listens on.
fn dead_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn help_lists_lifecycle_commands() {
    stackrig()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("blockchain"))
        .stdout(predicate::str::contains("database"));
}

#[test]
fn validate_accepts_a_well_formed_config() {
    let (_dir, config) = project(
        r#"
[servers.tas]
port = 8090
jar = "did-ta-server.jar"

[database]
port = 5432
user = "omn"
password = "omn"
name = "omn"
"#,
    );

    stackrig()
        .args(["validate", "-f", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 units registered"));
}

#[test]
fn validate_rejects_duplicate_ports() {
    let (_dir, config) = project(
        r#"
[servers.tas]
port = 8090
jar = "a.jar"

[servers.issuer]
port = 8090
jar = "b.jar"
"#,
    );

    stackrig()
        .args(["validate", "-f", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate port 8090"));
}

#[test]
fn missing_config_is_a_clean_error() {
    let dir = TempDir::new().unwrap();
    stackrig()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No stackrig.toml found"));
}

#[test]
fn health_of_a_down_unit_exits_nonzero() {
    let port = dead_port();
    let (_dir, config) = project(&format!(
        r#"
[servers.tas]
port = {port}
jar = "tas.jar"
"#
    ));

    stackrig()
        .args(["health", &port.to_string(), "-f", config.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("DOWN"));
}

#[test]
fn health_json_is_machine_readable() {
    let port = dead_port();
    let (_dir, config) = project(&format!(
        r#"
[servers.tas]
port = {port}
jar = "tas.jar"
"#
    ));

    let output = stackrig()
        .args([
            "health",
            &port.to_string(),
            "--json",
            "-f",
            config.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    let batch: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(batch["succeeded"], 0);
    assert_eq!(batch["outcomes"][0]["unit"], "tas");
    assert_eq!(batch["outcomes"][0]["state"], "DOWN");
}

#[test]
fn start_json_stdout_carries_only_json() {
    let port = dead_port();
    let (_dir, config) = project(&format!(
        r#"
[servers.tas]
port = {port}
jar = "missing.jar"
"#
    ));

    // A portless start runs the whole batch, which logs a summary at
    // info level; that line must land on stderr, not in the JSON stream.
    let output = stackrig()
        .args(["start", "--json", "-f", config.to_str().unwrap()])
        .output()
        .unwrap();

    let batch: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(batch["succeeded"], 0);
    assert_eq!(batch["outcomes"][0]["state"], "ERROR");
    assert!(String::from_utf8_lossy(&output.stderr).contains("start-all finished"));
}

#[test]
fn health_of_an_unknown_port_reports_not_found() {
    let (_dir, config) = project(
        r#"
[servers.tas]
port = 8090
jar = "tas.jar"
"#,
    );

    stackrig()
        .args(["health", "4242", "-f", config.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("no unit registered on port 4242"));
}

#[test]
fn database_status_classifies_script_output() {
    let (dir, config) = project(
        r#"
[database]
port = 15432
user = "omn"
password = "omn"
name = "omn"
"#,
    );
    let db_dir = dir.path().join("shells/Postgre");
    std::fs::create_dir_all(&db_dir).unwrap();
    write_script(
        &db_dir,
        "status.sh",
        "echo 'All databases are successfully created'",
    );

    stackrig()
        .args(["database", "status", "-f", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("UP"));
}

#[test]
fn init_writes_a_starter_config_once() {
    let dir = TempDir::new().unwrap();

    stackrig()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    assert!(dir.path().join("stackrig.toml").is_file());

    stackrig()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
