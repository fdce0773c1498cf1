//! End-to-end runs of the binary against a mock server

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::NamedTempFile;

fn katello(config: &NamedTempFile) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("katello-system"));
    cmd.env("NO_COLOR", "1")
        .env_remove("KATELLO_SERVER__URL")
        .env_remove("KATELLO_DEFAULTS__ORG")
        .env_remove("KATELLO_TASKS__TIMEOUT_SECS")
        .arg("--config")
        .arg(config.path());
    cmd
}

fn empty_config() -> NamedTempFile {
    NamedTempFile::new().expect("tmp config")
}

fn mock_system(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/katello/api/systems/u-1");
        then.status(200)
            .json_body(json!({ "uuid": "u-1", "name": "web01" }));
    });
}

fn mock_install(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/katello/api/systems/u-1/packages");
        then.status(202)
            .json_body(json!({ "uuid": "t-1", "state": "waiting" }));
    })
}

#[test]
fn given_name_and_uuid_when_running_then_usage_exit_without_request() {
    let config = empty_config();

    katello(&config)
        .args(["info", "--org", "ACME", "--name", "web01", "--uuid", "u-1"])
        .arg("--url")
        .arg("http://127.0.0.1:1/katello/api")
        .assert()
        .code(64);
}

#[test]
fn given_no_system_ref_when_running_then_usage_exit() {
    let config = empty_config();

    katello(&config)
        .args(["packages", "--org", "ACME"])
        .assert()
        .code(64);
}

#[test]
fn given_missing_config_file_when_running_then_config_exit() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("katello-system"));
    cmd.args(["--config", "/nonexistent/katello.toml", "list", "--org", "ACME"])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn given_finished_task_when_installing_then_success_and_description_once() {
    let server = MockServer::start();
    mock_system(&server);
    let install = mock_install(&server);
    server.mock(|when, then| {
        when.method(GET).path("/katello/api/systems/tasks/t-1");
        then.status(200).json_body(json!({
            "uuid": "t-1",
            "state": "finished",
            "result_description": "zsh-4.3.10 installed"
        }));
    });
    let config = empty_config();

    let assert = katello(&config)
        .arg("--url")
        .arg(server.url("/katello/api"))
        .args(["packages", "--org", "ACME", "--uuid", "u-1", "--install", "zsh"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Performing remote action [ t-1 ]"))
        .stdout(predicate::str::contains("Remote action finished:"));

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.matches("zsh-4.3.10 installed").count(), 1);
    install.assert_hits(1);
}

#[test]
fn given_failed_task_when_installing_then_dataerr_and_description_once() {
    let server = MockServer::start();
    mock_system(&server);
    mock_install(&server);
    server.mock(|when, then| {
        when.method(GET).path("/katello/api/systems/tasks/t-1");
        then.status(200).json_body(json!({
            "uuid": "t-1",
            "state": "error",
            "result_description": "No package(s) available to install"
        }));
    });
    let config = empty_config();

    let assert = katello(&config)
        .arg("--url")
        .arg(server.url("/katello/api"))
        .args(["packages", "--org", "ACME", "--uuid", "u-1", "--install", "zsh"])
        .assert()
        .code(65)
        .stdout(predicate::str::contains("Remote action failed:"));

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(
        stdout
            .matches("No package(s) available to install")
            .count(),
        1
    );
}

#[test]
fn given_unknown_uuid_when_showing_info_then_dataerr_with_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/katello/api/systems/nope");
        then.status(404);
    });
    let config = empty_config();

    katello(&config)
        .arg("--url")
        .arg(server.url("/katello/api"))
        .args(["info", "--org", "ACME", "--uuid", "nope"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("could not find system [ nope ]"));
}

#[test]
fn given_null_reply_when_adding_system_groups_then_dataerr_naming_system() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/katello/api/organizations/ACME/systems")
            .query_param("name", "web01");
        then.status(200)
            .json_body(json!([{ "uuid": "u-1", "name": "web01" }]));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/katello/api/organizations/ACME/system_groups");
        then.status(200)
            .json_body(json!([{ "id": 10, "name": "web" }]));
    });
    let add = server.mock(|when, then| {
        when.method(POST)
            .path("/katello/api/systems/u-1/system_groups");
        then.status(200)
            .header("content-type", "application/json")
            .body("null");
    });
    let config = empty_config();

    katello(&config)
        .arg("--url")
        .arg(server.url("/katello/api"))
        .args([
            "add_system_groups",
            "--org",
            "ACME",
            "--name",
            "web01",
            "--system_groups",
            "web",
        ])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("web01"));
    add.assert_hits(1);
}

#[test]
fn given_grep_flag_when_listing_then_tab_separated_rows_without_header() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/katello/api/organizations/ACME/systems");
        then.status(200).json_body(json!([
            { "uuid": "u-1", "name": "web01", "ipv4_address": "10.0.0.1" },
            { "uuid": "u-2", "name": "db01" }
        ]));
    });
    let config = empty_config();

    katello(&config)
        .arg("--url")
        .arg(server.url("/katello/api"))
        .args(["-g", "list", "--org", "ACME"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("web01\tu-1\t10.0.0.1"))
        .stdout(predicate::str::contains("Systems List").not());
}

#[test]
fn given_config_init_when_target_exists_then_requires_force() {
    let config = empty_config();

    katello(&config)
        .args(["config", "init"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--force"));

    katello(&config)
        .args(["config", "init", "--force"])
        .assert()
        .code(0);
    let written = std::fs::read_to_string(config.path()).unwrap();
    assert!(written.contains("[server]"));
}

#[test]
fn given_completion_request_when_running_then_prints_script() {
    let config = empty_config();

    katello(&config)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("katello-system"));
}
