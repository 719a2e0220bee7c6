use std::{fs, sync::Arc};

use chrono::{TimeZone, Utc};
use ehsebo_core::{KeyValueStorage, RecordStore, RECORDS_KEY};
use ehsebo_domain::{BudgetFormData, BudgetRecord};
use ehsebo_storage_json::JsonFileStorage;
use tempfile::tempdir;

fn record(id: &str, total_budget: f64) -> BudgetRecord {
    let now = Utc.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap();
    BudgetRecord::from_form(
        id,
        format!("Budget {id}"),
        BudgetFormData::new(total_budget, 100.0, 0.0, 0.0, 0.0),
        "user-1",
        now,
    )
}

#[tokio::test]
async fn json_storage_reads_writes_and_removes_keys() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonFileStorage::open(dir.path().join("store"))
        .await
        .expect("open storage");

    assert_eq!(storage.read("exchange_rate").await.expect("read"), None);
    storage.write("exchange_rate", "92.5").await.expect("write");
    assert_eq!(
        storage.read("exchange_rate").await.expect("read").as_deref(),
        Some("92.5")
    );
    assert!(storage.path_for("exchange_rate").exists());
    assert_eq!(storage.keys().await.expect("keys"), vec!["exchange_rate"]);

    storage.remove("exchange_rate").await.expect("remove");
    storage.remove("exchange_rate").await.expect("remove absent key");
    assert_eq!(storage.read("exchange_rate").await.expect("read"), None);
}

#[tokio::test]
async fn record_store_round_trips_through_files() {
    let dir = tempdir().expect("tempdir");
    let storage = Arc::new(
        JsonFileStorage::open(dir.path().to_path_buf())
            .await
            .expect("open storage"),
    );
    let store = RecordStore::new(storage.clone());
    for id in ["A", "B", "C"] {
        store.upsert(record(id, 500.0)).await.expect("upsert");
    }
    store.delete_by_id("B").await.expect("delete");

    let reopened = RecordStore::new(Arc::new(
        JsonFileStorage::open(dir.path().to_path_buf())
            .await
            .expect("reopen storage"),
    ));
    let loaded = reopened.load_all().await.expect("load");
    assert_eq!(loaded, vec![record("A", 500.0), record("C", 500.0)]);

    let raw = fs::read_to_string(storage.path_for(RECORDS_KEY)).expect("read file");
    assert!(raw.starts_with('['), "collection is stored as one JSON array");
    assert!(raw.contains("\"totalBudget\""));
}

fn leftover_tmp_files(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("list dir")
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

#[tokio::test]
async fn failed_write_cleans_up_and_keeps_store_state() {
    let dir = tempdir().expect("tempdir");
    let storage = Arc::new(
        JsonFileStorage::open(dir.path().to_path_buf())
            .await
            .expect("open storage"),
    );
    let store = RecordStore::new(storage.clone());
    assert!(store.load_all().await.expect("initial load").is_empty());

    // A non-empty directory at the destination makes the rename fail.
    let path = storage.path_for(RECORDS_KEY);
    fs::create_dir_all(path.join("blocker")).expect("create colliding dir");

    let err = store
        .upsert(record("A", 1.0))
        .await
        .expect_err("write must fail");
    assert!(err.is_storage());
    assert!(store.records().await.is_empty());
    assert!(leftover_tmp_files(dir.path()).is_empty());

    fs::remove_dir_all(&path).expect("cleanup");
    store.upsert(record("A", 1.0)).await.expect("retry succeeds");
    assert_eq!(store.len().await, 1);
    assert!(leftover_tmp_files(dir.path()).is_empty());
}

#[tokio::test]
async fn concurrent_writers_do_not_clobber_each_other() {
    let dir = tempdir().expect("tempdir");
    let storage = Arc::new(
        JsonFileStorage::open(dir.path().to_path_buf())
            .await
            .expect("open storage"),
    );
    let mut handles = Vec::new();
    for n in 0..16 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            storage.write("exchange_rate", &format!("{}", 80 + n)).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("every write succeeds");
    }

    let value = storage
        .read("exchange_rate")
        .await
        .expect("read")
        .expect("value present");
    let parsed: u32 = value.parse().expect("value is one complete write");
    assert!((80..96).contains(&parsed));
    assert!(leftover_tmp_files(dir.path()).is_empty());
}

#[tokio::test]
async fn reads_collections_written_by_earlier_versions() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonFileStorage::open(dir.path().to_path_buf())
        .await
        .expect("open storage");
    let legacy = r#"[{"id":"1718000000000","name":"June","totalBudget":500,"medicalExpenses":100,"salaries":0,"carRental":0,"otherExpenses":0,"remaining":400,"createdAt":"2024-06-10T08:13:20.000Z","updatedAt":"2024-06-10T08:13:20.000Z","userId":"google-1"}]"#;
    fs::write(storage.path_for(RECORDS_KEY), legacy).expect("write legacy file");

    let store = RecordStore::new(Arc::new(storage));
    let loaded = store.load_all().await.expect("load legacy");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].remaining, 400.0);
    assert_eq!(loaded[0].user_id, "google-1");
}
