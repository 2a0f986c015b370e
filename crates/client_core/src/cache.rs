//! Time-boxed snapshots of entity collections kept in the local key-value store.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use storage::KeyValueStore;
use tracing::{debug, warn};

use crate::clock::Clock;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
/// Every list snapshot key ends with this, e.g. `companies_cache`.
pub const CACHE_KEY_SUFFIX: &str = "_cache";

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub written_at: DateTime<Utc>,
}

pub struct LocalCache<T> {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    _items: PhantomData<fn() -> T>,
}

impl<T> Clone for LocalCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
            _items: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> LocalCache<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            _items: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the snapshot while it is younger than the ttl. Expired or
    /// unreadable entries are purged and reported as a miss.
    pub async fn read(&self, key: &str) -> Option<Snapshot<T>> {
        let entry = match self.store.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "cache read failed; treating as miss");
                return None;
            }
        };

        if !self.is_fresh(entry.written_at) {
            debug!(key, written_at = %entry.written_at, "cache entry expired");
            self.purge(key).await;
            return None;
        }

        match serde_json::from_str::<Vec<T>>(&entry.value) {
            Ok(items) => Some(Snapshot {
                items,
                written_at: entry.written_at,
            }),
            Err(err) => {
                warn!(key, error = %err, "cache entry is unreadable; purging");
                self.purge(key).await;
                None
            }
        }
    }

    pub async fn write(&self, key: &str, items: &[T]) -> Result<()> {
        let value = serde_json::to_string(items)
            .with_context(|| format!("failed to serialize cache entry '{key}'"))?;
        self.store.put(key, &value, self.clock.now()).await?;
        debug!(key, items = items.len(), "cache entry written");
        Ok(())
    }

    pub async fn clear(&self, key: &str) -> Result<()> {
        if self.store.remove(key).await? {
            debug!(key, "cache entry cleared");
        }
        Ok(())
    }

    fn is_fresh(&self, written_at: DateTime<Utc>) -> bool {
        match (self.clock.now() - written_at).to_std() {
            Ok(age) => age < self.ttl,
            // Written "in the future" relative to our clock: still fresh.
            Err(_) => true,
        }
    }

    async fn purge(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            warn!(key, error = %err, "failed to purge cache entry");
        }
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
