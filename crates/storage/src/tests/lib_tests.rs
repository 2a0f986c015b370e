use super::*;
use chrono::{Duration, TimeZone};

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
}

async fn exercise_store(store: &dyn KeyValueStore) {
    assert!(store.get("theme").await.expect("get").is_none());

    store.put("theme", "dark", at(0)).await.expect("put");
    store
        .put("companies_cache", "[]", at(1))
        .await
        .expect("put cache");

    let entry = store.get("theme").await.expect("get").expect("entry");
    assert_eq!(entry.value, "dark");
    assert_eq!(entry.written_at, at(0));

    store.put("theme", "light", at(5)).await.expect("overwrite");
    let entry = store.get("theme").await.expect("get").expect("entry");
    assert_eq!(entry.value, "light");
    assert_eq!(entry.written_at, at(0) + Duration::minutes(5));

    assert_eq!(
        store.keys().await.expect("keys"),
        vec!["companies_cache".to_string(), "theme".to_string()]
    );

    assert!(store.remove("companies_cache").await.expect("remove"));
    assert!(!store.remove("companies_cache").await.expect("remove again"));

    store.clear().await.expect("clear");
    assert!(store.keys().await.expect("keys").is_empty());
}

#[tokio::test]
async fn memory_store_round_trips_entries() {
    exercise_store(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_store_round_trips_entries() {
    let store = SqliteStore::new("sqlite::memory:").await.expect("db");
    exercise_store(&store).await;
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = SqliteStore::new("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("console.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let store = SqliteStore::new(&database_url).await.expect("db");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_file_path() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert!(sqlite_path("sqlite://file:cache?mode=memory&cache=shared").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/console.db?mode=rwc"),
        Some(PathBuf::from("./data/console.db"))
    );
}
