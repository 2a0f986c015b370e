//! List Controller: owns the loaded collection and the search/sort/page state
//! of one list view, and keeps it in step with the backend and the cache.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::protocol::{ExportFormat, ExportRequest, StatusAction};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::{EntityApi, RemoteError},
    cache::LocalCache,
    clock::Clock,
    context::ConsoleContext,
    entity::Entity,
    export::{export_filename, DownloadSink},
    form::SaveListener,
    view::{self, DerivedView, ListQuery, SortDirection},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { count: usize },
    /// The fetch failed while cached data stayed on screen.
    KeptStale,
    /// A newer reload was issued, or the view was unmounted, before this one resolved.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved { filename: String, bytes: usize },
    AlreadyInFlight,
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("failed to save {filename}: {message}")]
    Save { filename: String, message: String },
}

struct ListState<T: Entity> {
    all: Vec<T>,
    query: ListQuery<T::Field>,
    load: LoadState,
    from_cache: bool,
    last_refresh_counter: Option<u64>,
}

impl<T: Entity> ListState<T> {
    fn filtered_count(&self) -> usize {
        let needle = self.query.search.to_lowercase();
        self.all
            .iter()
            .filter(|item| view::matches_search(*item, &needle))
            .count()
    }

    fn clamp_page(&mut self) {
        let total_pages = view::total_pages(self.filtered_count(), self.query.page_size);
        self.query.page = view::clamp_page(self.query.page, total_pages);
    }
}

/// Clears the export flag when the export future completes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ListController<T: Entity, A> {
    api: A,
    cache: Option<LocalCache<T>>,
    clock: Arc<dyn Clock>,
    state: Mutex<ListState<T>>,
    reload_seq: AtomicU64,
    mounted: AtomicBool,
    export_in_flight: AtomicBool,
}

impl<T, A> ListController<T, A>
where
    T: Entity,
    A: EntityApi<T>,
{
    /// A controller that always goes to the network.
    pub fn new(api: A, clock: Arc<dyn Clock>) -> Self {
        Self::build(api, None, clock)
    }

    /// A controller that serves and repopulates the context's cache for `T`.
    pub fn with_cache(api: A, context: &ConsoleContext) -> Self {
        Self::build(api, Some(context.cache::<T>()), context.clock())
    }

    fn build(api: A, cache: Option<LocalCache<T>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            cache,
            clock,
            state: Mutex::new(ListState {
                all: Vec::new(),
                query: ListQuery::default(),
                load: LoadState::Idle,
                from_cache: false,
                last_refresh_counter: None,
            }),
            reload_seq: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
            export_in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Shows a valid cached snapshot immediately, then fetches from the network.
    pub async fn mount(&self) -> Result<ReloadOutcome, ListError> {
        self.mounted.store(true, Ordering::SeqCst);

        if let Some(cache) = &self.cache {
            if let Some(snapshot) = cache.read(&T::cache_key()).await {
                let mut state = self.state.lock().await;
                debug!(
                    resource = T::RESOURCE,
                    items = snapshot.items.len(),
                    "serving cached snapshot"
                );
                state.all = snapshot.items;
                state.load = LoadState::Ready;
                state.from_cache = true;
                state.clamp_page();
            }
        }

        self.reload().await
    }

    /// Later responses for this view are dropped.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Fetches the full collection and replaces the held one.
    pub async fn reload(&self) -> Result<ReloadOutcome, ListError> {
        let seq = self.reload_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            if state.load != LoadState::Ready {
                state.load = LoadState::Loading;
            }
        }

        let result = self.api.list(&T::Filter::default()).await;

        if !self.mounted.load(Ordering::SeqCst) {
            debug!(resource = T::RESOURCE, "discarding response for unmounted list");
            return Ok(ReloadOutcome::Discarded);
        }

        match result {
            Ok(items) => {
                if self.reload_seq.load(Ordering::SeqCst) != seq {
                    debug!(resource = T::RESOURCE, seq, "discarding stale list response");
                    return Ok(ReloadOutcome::Discarded);
                }

                let mut state = self.state.lock().await;
                // Re-check under the lock: a newer reload may have applied meanwhile.
                // The cache is written while the lock is held so it always matches `state`.
                if self.reload_seq.load(Ordering::SeqCst) != seq {
                    return Ok(ReloadOutcome::Discarded);
                }
                if let Some(cache) = &self.cache {
                    if let Err(err) = cache.write(&T::cache_key(), &items).await {
                        warn!(resource = T::RESOURCE, error = %err, "failed to refresh list cache");
                    }
                }
                let count = items.len();
                state.all = items;
                state.load = LoadState::Ready;
                state.from_cache = false;
                state.clamp_page();
                debug!(resource = T::RESOURCE, count, "list reloaded");
                Ok(ReloadOutcome::Applied { count })
            }
            Err(err) => {
                if self.reload_seq.load(Ordering::SeqCst) != seq {
                    return Ok(ReloadOutcome::Discarded);
                }
                let mut state = self.state.lock().await;
                if state.from_cache {
                    warn!(
                        resource = T::RESOURCE,
                        error = %err,
                        "list fetch failed; keeping cached data on screen"
                    );
                    state.load = LoadState::Ready;
                    return Ok(ReloadOutcome::KeptStale);
                }
                state.load = LoadState::Failed(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Explicit user refresh: never resurrects the cached snapshot.
    pub async fn refresh(&self) -> Result<ReloadOutcome, ListError> {
        self.invalidate_cache().await;
        self.reload().await
    }

    /// Feeds the parent page's refresh counter. The first value seen is the
    /// baseline; any later change forces a refresh.
    pub async fn on_refresh_trigger(&self, counter: u64) -> Result<Option<ReloadOutcome>, ListError> {
        {
            let mut state = self.state.lock().await;
            let previous = state.last_refresh_counter.replace(counter);
            match previous {
                None => return Ok(None),
                Some(previous) if previous == counter => return Ok(None),
                Some(_) => {}
            }
        }
        self.refresh().await.map(Some)
    }

    /// Called after any successful create, update, delete or status change.
    pub async fn notify_mutation(&self) -> Result<ReloadOutcome, ListError> {
        self.refresh().await
    }

    pub async fn delete(&self, id: T::Id) -> Result<ReloadOutcome, ListError> {
        self.api.delete(id).await?;
        info!(resource = T::RESOURCE, %id, "record deleted");
        self.notify_mutation().await
    }

    pub async fn change_status(
        &self,
        id: T::Id,
        action: StatusAction,
    ) -> Result<ReloadOutcome, ListError> {
        self.api.transition(id, action).await?;
        info!(
            resource = T::RESOURCE,
            %id,
            status = action.resulting_status().as_str(),
            "record status changed"
        );
        self.notify_mutation().await
    }

    pub async fn set_search(&self, term: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.query.search = term.into();
        state.query.page = 1;
    }

    pub async fn set_sort(&self, field: T::Field) {
        let mut state = self.state.lock().await;
        if state.query.sort == Some(field) {
            state.query.direction = state.query.direction.flipped();
        } else {
            state.query.sort = Some(field);
            state.query.direction = SortDirection::Ascending;
        }
    }

    pub async fn set_rows_per_page(&self, rows: usize) {
        let mut state = self.state.lock().await;
        state.query.page_size = rows.max(1);
        state.query.page = 1;
    }

    pub async fn set_page(&self, page: usize) {
        let mut state = self.state.lock().await;
        state.query.page = page;
        state.clamp_page();
    }

    pub async fn derived_view(&self) -> DerivedView<T> {
        let mut state = self.state.lock().await;
        let derived = view::derive(&state.all, &state.query);
        state.query.page = derived.page;
        derived
    }

    pub async fn query(&self) -> ListQuery<T::Field> {
        self.state.lock().await.query.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.lock().await.load.clone()
    }

    pub async fn is_showing_cached(&self) -> bool {
        self.state.lock().await.from_cache
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.all.clone()
    }

    pub async fn find(&self, id: T::Id) -> Option<T> {
        self.state
            .lock()
            .await
            .all
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn is_exporting(&self) -> bool {
        self.export_in_flight.load(Ordering::SeqCst)
    }

    /// Requests an export for the current search term only and hands the blob
    /// to `sink`. A call made while another export is running is a no-op.
    pub async fn export(
        &self,
        format: ExportFormat,
        sink: &dyn DownloadSink,
    ) -> Result<ExportOutcome, ListError> {
        if self
            .export_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(resource = T::RESOURCE, "export already in flight");
            return Ok(ExportOutcome::AlreadyInFlight);
        }
        let _in_flight = InFlight(&self.export_in_flight);

        let search = {
            let state = self.state.lock().await;
            let term = &state.query.search;
            (!term.is_empty()).then(|| term.clone())
        };
        let request = ExportRequest {
            file_format: format,
            search,
        };
        let bytes = self.api.export(&request).await?;

        let filename = export_filename(T::EXPORT_PREFIX, format, self.clock.now());
        sink.save(&filename, &bytes)
            .await
            .map_err(|err| ListError::Save {
                filename: filename.clone(),
                message: format!("{err:#}"),
            })?;
        info!(resource = T::RESOURCE, %filename, bytes = bytes.len(), "export complete");
        Ok(ExportOutcome::Saved {
            filename,
            bytes: bytes.len(),
        })
    }

    async fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.clear(&T::cache_key()).await {
                warn!(resource = T::RESOURCE, error = %err, "failed to clear list cache");
            }
        }
        self.state.lock().await.from_cache = false;
    }
}

#[async_trait]
impl<T, A> SaveListener<T> for ListController<T, A>
where
    T: Entity,
    A: EntityApi<T>,
{
    async fn saved(&self, entity: &T) {
        debug!(resource = T::RESOURCE, id = %entity.id(), "reloading after save");
        if let Err(err) = self.notify_mutation().await {
            warn!(resource = T::RESOURCE, error = %err, "reload after save failed");
        }
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
