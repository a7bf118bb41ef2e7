use std::env;
use std::fs;
use std::sync::Arc;

use assert_unordered::assert_eq_unordered_sort;
use serial_test::serial;
use tempfile::TempDir;

use metadata_manager::config::context::build_session;
use metadata_manager::config::schema::load_config_from_env;
use metadata_manager::dao::json::JsonSessionManager;
use metadata_manager::error::ErrorCode;
use metadata_manager::metadata::{Indexes, Statistics, Tables};
use metadata_manager::model::{Column, ColumnStatistic, Index, Table};

fn make_table(name: &str) -> Table {
    let mut table = Table::new(name);
    table.namespace = Some("public".to_string());
    table.columns = vec![
        Column::new("id", 1, 20, false),
        Column::new("label", 2, 1043, true),
    ];
    table
}

async fn open_tables(dir: &TempDir) -> Tables {
    let tables = Tables::new(Arc::new(JsonSessionManager::new(dir.path())));
    tables.init().await.unwrap();
    tables
}

#[tokio::test]
async fn test_committed_tables_survive_a_new_session() {
    let dir = TempDir::new().unwrap();

    let first = open_tables(&dir).await;
    let t1 = first.add(&make_table("t1")).await.unwrap();
    let t2 = first.add(&make_table("t2")).await.unwrap();

    let second = open_tables(&dir).await;
    let names: Vec<String> = second
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq_unordered_sort!(names, vec!["t1".to_string(), "t2".to_string()]);
    assert_eq!(second.get_by_name("t2").await.unwrap().id, Some(t2));

    // Ids continue where the previous session stopped
    let t3 = second.add(&make_table("t3")).await.unwrap();
    assert!(t3 > t2 && t2 > t1);
}

#[tokio::test]
async fn test_failed_add_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let tables = open_tables(&dir).await;
    tables.add(&make_table("t1")).await.unwrap();

    assert_eq!(
        tables.add(&make_table("t1")).await.unwrap_err(),
        ErrorCode::TableNameAlreadyExists
    );

    let reopened = open_tables(&dir).await;
    let all = reopened.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].columns.len(), 2);
}

#[tokio::test]
async fn test_failed_commit_is_rolled_back() {
    let dir = TempDir::new().unwrap();
    let tables = open_tables(&dir).await;

    // Make the tables document unwritable
    let document = dir.path().join("tables.json");
    fs::remove_file(&document).unwrap();
    fs::create_dir(&document).unwrap();
    fs::write(document.join("blocker"), "").unwrap();

    assert_eq!(
        tables.add(&make_table("t1")).await.unwrap_err(),
        ErrorCode::InternalError
    );
    assert_eq!(
        tables.get_by_name("t1").await.unwrap_err(),
        ErrorCode::NameNotFound
    );

    // A later commit doesn't carry the failed table along
    fs::remove_dir_all(&document).unwrap();
    tables.add(&make_table("t2")).await.unwrap();
    let reopened = open_tables(&dir).await;
    let names: Vec<String> = reopened
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["t2".to_string()]);
}

#[tokio::test]
async fn test_privileges_need_a_database_backend() {
    let dir = TempDir::new().unwrap();
    let tables = open_tables(&dir).await;

    assert_eq!(
        tables.get_acls("reader").await.unwrap_err(),
        ErrorCode::NotSupported
    );
    assert_eq!(
        tables
            .confirm_permission_in_acls_by_name("reader", "r")
            .await
            .unwrap_err(),
        ErrorCode::NotSupported
    );
}

#[tokio::test]
async fn test_statistics_follow_their_table() {
    let dir = TempDir::new().unwrap();
    let session = Arc::new(JsonSessionManager::new(dir.path()));
    let tables = Tables::new(session.clone());
    let statistics = Statistics::new(session.clone());
    let indexes = Indexes::new(session);

    let table_id = tables.add(&make_table("t1")).await.unwrap();
    for ordinal_position in [1, 2] {
        statistics
            .add(&ColumnStatistic {
                table_id: Some(table_id),
                ordinal_position: Some(ordinal_position),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    indexes
        .add(&Index {
            name: "t1_pkey".to_string(),
            table_id: Some(table_id),
            is_primary: true,
            keys: vec![1],
            ..Default::default()
        })
        .await
        .unwrap();

    let positions: Vec<i64> = statistics
        .get_all_by_table_id(table_id)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|s| s.ordinal_position)
        .collect();
    assert_eq_unordered_sort!(positions, vec![1, 2]);

    tables.remove_by_name("t1").await.unwrap();
    assert!(statistics.get_all().await.unwrap().is_empty());
    // Indexes are managed on their own
    assert!(indexes.get_by_name("t1_pkey").await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_session_from_environment() {
    let dir = TempDir::new().unwrap();
    env::set_var("METADATA_BACKEND__TYPE", "json");
    env::set_var(
        "METADATA_BACKEND__STORAGE_DIR",
        dir.path().join("catalog").to_str().unwrap(),
    );

    let config = load_config_from_env();

    env::remove_var("METADATA_BACKEND__TYPE");
    env::remove_var("METADATA_BACKEND__STORAGE_DIR");

    let session = build_session(&config.unwrap());
    session.connect().await.unwrap();
    let tables = Tables::new(session);
    tables.add(&make_table("t1")).await.unwrap();

    assert!(dir.path().join("catalog").join("tables.json").exists());
}
