use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Seeds the credential file the way the binary writes it.
fn seed_credentials(home: &Path, access: &str, refresh: &str) {
    fs::write(
        home.join("credentials.json"),
        json!({ "access_token": access, "refresh_token": refresh }).to_string(),
    )
    .unwrap();
}

fn task_json(id: i64, title: &str, done: bool) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "content": "content",
        "deadline": "2024-01-01T10:00:00",
        "is_done": done,
        "created_at": "2023-12-30T08:15:00"
    })
}

#[tokio::test]
async fn test_list_renders_task_table() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            task_json(1, "Water the plants", false),
            task_json(2, "Buy groceries", true),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Water the plants"))
        .stdout(predicate::str::contains("Buy groceries"))
        .stdout(predicate::str::contains("2024-01-01 10:00"));
}

#[tokio::test]
async fn test_list_empty() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[tokio::test]
async fn test_stale_token_is_refreshed_and_persisted() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A2",
            "refresh_token": "R2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([task_json(1, "After refresh", false)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_AUTH_URL", format!("{}/api/auth", mock_server.uri()))
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("After refresh"));

    let stored = fs::read_to_string(home.path().join("credentials.json")).unwrap();
    assert!(stored.contains("A2"));
    assert!(stored.contains("R2"));
    assert!(!stored.contains("\"A1\""));
}

#[tokio::test]
async fn test_expired_session_asks_for_login() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    // Access token only; nothing to refresh with.
    fs::write(
        home.path().join("credentials.json"),
        json!({ "access_token": "A1" }).to_string(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_AUTH_URL", format!("{}/api/auth", mock_server.uri()))
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session expired"));
}

#[tokio::test]
async fn test_add_task() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("POST"))
        .and(path("/api/tasks/create"))
        .and(body_json(json!({
            "title": "x",
            "content": "y",
            "deadline": "2024-01-01T10:00:00",
            "is_done": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(42, "x", false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args([
            "tasks",
            "add",
            "--title",
            "x",
            "--content",
            "y",
            "--deadline",
            "2024-01-01T10:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task 42"));
}

#[tokio::test]
async fn test_edit_marks_done() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("PATCH"))
        .and(path("/api/tasks/7"))
        .and(body_json(json!({ "is_done": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(7, "x", true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "edit", "7", "--done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated task 7."));
}

#[test]
fn test_edit_requires_a_change() {
    let home = tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .args(["tasks", "edit", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[tokio::test]
async fn test_delete_task() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("DELETE"))
        .and(path("/api/tasks/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "message": "Task 7 deleted"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "delete", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task 7 deleted"));
}

#[tokio::test]
async fn test_task_not_found_surfaces_detail() {
    let mock_server = MockServer::start().await;
    let home = tempdir().unwrap();
    seed_credentials(home.path(), "A1", "R1");

    Mock::given(method("GET"))
        .and(path("/api/tasks/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({
                "detail": "Task with ID 99 not found"
            })),
        )
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", home.path())
        .env("TASKDECK_TASKS_URL", format!("{}/api/tasks", mock_server.uri()))
        .args(["tasks", "show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task with ID 99 not found"));
}
