use std::process::Command;
use std::sync::Arc;

use assert_cmd::prelude::*;
use serde_json::Value;
use tempfile::{Builder, TempDir};

use metadata_manager::dao::json::JsonSessionManager;
use metadata_manager::metadata::Tables;
use metadata_manager::model::{Column, Table};

fn setup_storage_dir() -> std::io::Result<TempDir> {
    Builder::new()
        .prefix("metadata-test-dir")
        .rand_bytes(5)
        .tempdir()
}

fn metadata_manager(storage_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("metadata-manager").expect("binary exists");
    cmd.env("METADATA_BACKEND__TYPE", "json")
        .env("METADATA_BACKEND__STORAGE_DIR", storage_dir.path())
        .env("RUST_LOG", "metadata_manager=debug");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command ran");
    assert!(output.status.success(), "{output:?}");
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[tokio::test]
async fn test_cli_reads_and_updates_tables() {
    let storage_dir = setup_storage_dir().unwrap();

    metadata_manager(&storage_dir).arg("init").assert().success();

    let tables = Tables::new(Arc::new(JsonSessionManager::new(storage_dir.path())));
    let mut table = Table::new("events");
    table.columns = vec![Column::new("id", 1, 20, false)];
    let table_id = tables.add(&table).await.unwrap();

    let listed = stdout_json(metadata_manager(&storage_dir).arg("tables"));
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["name"], "events");

    let shown = stdout_json(
        metadata_manager(&storage_dir)
            .arg("table")
            .arg(table_id.to_string()),
    );
    assert_eq!(shown["columns"][0]["name"], "id");

    metadata_manager(&storage_dir)
        .args(["set-tuples", "events", "250"])
        .assert()
        .success();

    let reopened = Tables::new(Arc::new(JsonSessionManager::new(storage_dir.path())));
    assert_eq!(
        reopened.get_statistic(table_id).await.unwrap().tuples,
        Some(250.0)
    );
}

#[test]
fn test_cli_datatypes() {
    let storage_dir = setup_storage_dir().unwrap();

    let datatypes = stdout_json(metadata_manager(&storage_dir).arg("datatypes"));
    let names: Vec<&str> = datatypes
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.contains(&"INT32"));
    assert!(names.contains(&"TIMESTAMPTZ"));
}

#[test]
fn test_cli_reports_missing_objects() {
    let storage_dir = setup_storage_dir().unwrap();

    metadata_manager(&storage_dir)
        .args(["table", "missing"])
        .assert()
        .failure()
        .code(1);
    metadata_manager(&storage_dir)
        .args(["role", "0"])
        .assert()
        .failure()
        .code(1);
    metadata_manager(&storage_dir)
        .args(["table", "99999999999999999999"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_cli_rejects_bad_config() {
    let storage_dir = setup_storage_dir().unwrap();

    metadata_manager(&storage_dir)
        .env("METADATA_BACKEND__TYPE", "sqlite")
        .arg("tables")
        .assert()
        .failure()
        .code(2);
}

#[tokio::test]
async fn test_cli_rejects_bad_row_counts() {
    let storage_dir = setup_storage_dir().unwrap();

    let tables = Tables::new(Arc::new(JsonSessionManager::new(storage_dir.path())));
    let table_id = tables.add(&Table::new("events")).await.unwrap();

    for tuples in ["many", "1e40", " 5", ""] {
        metadata_manager(&storage_dir)
            .args(["set-tuples", "events", tuples])
            .assert()
            .failure()
            .code(1);
    }

    let reopened = Tables::new(Arc::new(JsonSessionManager::new(storage_dir.path())));
    assert_eq!(reopened.get_statistic(table_id).await.unwrap().tuples, None);
}
