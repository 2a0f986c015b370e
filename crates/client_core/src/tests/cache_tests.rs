use super::*;
use crate::{
    clock::ManualClock,
    test_support::{industries, industry},
};
use chrono::{Duration as ChronoDuration, TimeZone};
use shared::domain::Industry;
use storage::MemoryStore;

const KEY: &str = "industries_cache";

fn fixture() -> (Arc<MemoryStore>, Arc<ManualClock>, LocalCache<Industry>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    ));
    let cache = LocalCache::new(store.clone(), clock.clone(), DEFAULT_CACHE_TTL);
    (store, clock, cache)
}

#[tokio::test]
async fn absent_key_is_a_miss() {
    let (_store, _clock, cache) = fixture();
    assert!(cache.read(KEY).await.is_none());
}

#[tokio::test]
async fn entry_is_a_hit_just_before_ten_minutes() {
    let (_store, clock, cache) = fixture();
    let written_at = clock.now();
    cache.write(KEY, &industries(3)).await.expect("write");

    clock.advance(ChronoDuration::minutes(9) + ChronoDuration::seconds(59));
    let snapshot = cache.read(KEY).await.expect("hit");
    assert_eq!(snapshot.items, industries(3));
    assert_eq!(snapshot.written_at, written_at);
}

#[tokio::test]
async fn entry_is_purged_just_after_ten_minutes() {
    let (store, clock, cache) = fixture();
    cache.write(KEY, &industries(3)).await.expect("write");

    clock.advance(ChronoDuration::minutes(10) + ChronoDuration::seconds(1));
    assert!(cache.read(KEY).await.is_none());
    assert!(
        store.get(KEY).await.expect("get").is_none(),
        "expired entry should be removed on read"
    );
}

#[tokio::test]
async fn rewrite_restarts_the_expiry_window() {
    let (_store, clock, cache) = fixture();
    cache.write(KEY, &industries(1)).await.expect("write");
    clock.advance(ChronoDuration::minutes(8));
    cache.write(KEY, &[industry(9, "Shipping")]).await.expect("rewrite");
    clock.advance(ChronoDuration::minutes(8));

    let snapshot = cache.read(KEY).await.expect("hit");
    assert_eq!(snapshot.items[0].industry_name, "Shipping");
}

#[tokio::test]
async fn clear_removes_the_entry() {
    let (_store, _clock, cache) = fixture();
    cache.write(KEY, &industries(2)).await.expect("write");
    cache.clear(KEY).await.expect("clear");
    assert!(cache.read(KEY).await.is_none());
    cache.clear(KEY).await.expect("clearing twice is fine");
}

#[tokio::test]
async fn unreadable_entry_is_purged() {
    let (store, clock, cache) = fixture();
    store
        .put(KEY, "{not json", clock.now())
        .await
        .expect("put garbage");
    assert!(cache.read(KEY).await.is_none());
    assert!(store.get(KEY).await.expect("get").is_none());
}

#[tokio::test]
async fn caches_are_keyed_per_entity() {
    let (_store, _clock, cache) = fixture();
    cache.write(KEY, &industries(2)).await.expect("write");
    assert!(cache.read("companies_cache").await.is_none());
}
