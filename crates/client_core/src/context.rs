//! Explicit console state: the persisted theme preference and the per-entity
//! list caches, handed to controllers instead of living in ambient globals.

use std::{fmt, sync::Arc, time::Duration};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use storage::{KeyValueStore, MemoryStore};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    cache::{LocalCache, CACHE_KEY_SUFFIX, DEFAULT_CACHE_TTL},
    clock::{Clock, SystemClock},
};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ConsoleContext {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    cache_ttl: Duration,
    theme: RwLock<Theme>,
}

impl ConsoleContext {
    /// Loads the persisted theme; an unknown stored value falls back to light.
    pub async fn init(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        cache_ttl: Duration,
    ) -> Result<Arc<Self>> {
        let theme = match store.get(THEME_KEY).await? {
            Some(entry) => Theme::parse(&entry.value).unwrap_or_else(|| {
                warn!(stored = %entry.value, "ignoring unknown theme preference");
                Theme::default()
            }),
            None => Theme::default(),
        };

        Ok(Arc::new(Self {
            store,
            clock,
            cache_ttl,
            theme: RwLock::new(theme),
        }))
    }

    pub async fn in_memory() -> Result<Arc<Self>> {
        Self::init(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            DEFAULT_CACHE_TTL,
        )
        .await
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn cache<T: Serialize + DeserializeOwned>(&self) -> LocalCache<T> {
        LocalCache::new(self.store(), self.clock(), self.cache_ttl)
    }

    pub async fn theme(&self) -> Theme {
        *self.theme.read().await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store
            .put(THEME_KEY, theme.as_str(), self.clock.now())
            .await?;
        *self.theme.write().await = theme;
        Ok(())
    }

    /// Removes every list snapshot, leaving the theme in place. Returns the
    /// number of snapshots dropped.
    pub async fn clear_caches(&self) -> Result<usize> {
        let mut cleared = 0;
        for key in self.store.keys().await? {
            if key.ends_with(CACHE_KEY_SUFFIX) && self.store.remove(&key).await? {
                debug!(%key, "cleared list cache");
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Drops every persisted entry and returns the theme to its default.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear().await?;
        *self.theme.write().await = Theme::default();
        info!("console state reset");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
