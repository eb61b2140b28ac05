//! # Journey Store
//!
//! Read-through cache of the journey list plus the view state (filter and
//! sort) the journey screens work with.
//!
//! ## Architecture
//!
//! The store is an explicit state object owned by whoever mounts the journey
//! screens; there is no global instance. It manages:
//! - The raw journey list, replaced only by a full reload from the API
//! - The active filter and sort
//! - A cached filtered+sorted view with its metrics, rebuilt lazily
//! - Loading and error state for the UI
//!
//! Remote operations are serialized through a gate so two mutations never
//! interleave their call-then-reload sequences. Each operation races a
//! cancellation token: [`JourneyStore::cancel_pending`] abandons what is in
//! flight, [`JourneyStore::shutdown`] (or dropping the store) abandons it for
//! good. A cancelled operation never writes journeys or error state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::JourneyApi;
use crate::error::{GiroError, Result};
use crate::filter::{apply_filter, JourneyFilter};
use crate::journey::{Journey, JourneyInput, JourneyPatch};
use crate::metrics::{compute_metrics_with, JourneyMetrics, MetricsConfig};
use crate::quick_filter::quick_filter;
use crate::sort::{apply_sort, JourneySortOption};

// ============================================================================
// State
// ============================================================================

/// Everything the journey screens render in one consistent read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyView {
    pub journeys: Vec<Journey>,
    pub metrics: JourneyMetrics,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: JourneyFilter,
    pub sort: JourneySortOption,
}

#[derive(Debug, Clone)]
struct CachedView {
    journeys: Vec<Journey>,
    metrics: JourneyMetrics,
}

#[derive(Debug, Default)]
struct StoreState {
    raw: Vec<Journey>,
    filter: JourneyFilter,
    sort: JourneySortOption,
    /// Remote operations queued or in flight
    pending: usize,
    error: Option<String>,
    /// None when raw data, filter or sort changed since the last build
    view: Option<CachedView>,
}

impl StoreState {
    fn ensure_view(&mut self, config: &MetricsConfig) -> &CachedView {
        let (raw, filter, sort) = (&self.raw, &self.filter, &self.sort);
        self.view.get_or_insert_with(|| {
            let filtered = apply_filter(raw, filter);
            let journeys = apply_sort(&filtered, sort);
            let metrics = compute_metrics_with(&journeys, config);
            CachedView { journeys, metrics }
        })
    }

    fn invalidate_view(&mut self) {
        self.view = None;
    }
}

// ============================================================================
// Journey Store
// ============================================================================

/// Journey list state backed by a remote [`JourneyApi`].
pub struct JourneyStore {
    api: Arc<dyn JourneyApi>,
    state: Mutex<StoreState>,
    /// Serializes remote operations
    gate: tokio::sync::Mutex<()>,
    /// Cancelled on shutdown; parent of every operation token
    lifetime: CancellationToken,
    /// Token handed to new operations; replaced by `cancel_pending`
    current: Mutex<CancellationToken>,
    metrics_config: MetricsConfig,
}

impl JourneyStore {
    pub fn new(api: Arc<dyn JourneyApi>) -> Self {
        Self::with_metrics_config(api, MetricsConfig::default())
    }

    pub fn with_metrics_config(api: Arc<dyn JourneyApi>, metrics_config: MetricsConfig) -> Self {
        let lifetime = CancellationToken::new();
        let current = lifetime.child_token();
        Self {
            api,
            state: Mutex::new(StoreState::default()),
            gate: tokio::sync::Mutex::new(()),
            lifetime,
            current: Mutex::new(current),
            metrics_config,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn operation_token(&self) -> CancellationToken {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The filtered and sorted journey list.
    pub fn journeys(&self) -> Vec<Journey> {
        let mut state = self.state();
        state.ensure_view(&self.metrics_config).journeys.clone()
    }

    /// Metrics over the filtered and sorted list.
    pub fn metrics(&self) -> JourneyMetrics {
        let mut state = self.state();
        state.ensure_view(&self.metrics_config).metrics
    }

    /// True while any remote operation is queued or in flight.
    pub fn loading(&self) -> bool {
        self.state().pending > 0
    }

    /// Message of the last failed operation, cleared by the next success.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn filter(&self) -> JourneyFilter {
        self.state().filter.clone()
    }

    pub fn sort(&self) -> JourneySortOption {
        self.state().sort
    }

    /// Unfiltered journey count as last loaded.
    pub fn total_count(&self) -> usize {
        self.state().raw.len()
    }

    /// Journeys, metrics and status in one consistent read.
    pub fn snapshot(&self) -> JourneyView {
        let mut state = self.state();
        let view = state.ensure_view(&self.metrics_config).clone();
        JourneyView {
            journeys: view.journeys,
            metrics: view.metrics,
            loading: state.pending > 0,
            error: state.error.clone(),
            filter: state.filter.clone(),
            sort: state.sort,
        }
    }

    // ========================================================================
    // View state
    // ========================================================================

    /// Replace the active filter. The view is rebuilt on the next read.
    pub fn set_filter(&self, filter: JourneyFilter) {
        let mut state = self.state();
        if state.filter != filter {
            state.filter = filter;
            state.invalidate_view();
        }
    }

    /// Replace the active sort. The view is rebuilt on the next read.
    pub fn set_sort(&self, sort: JourneySortOption) {
        let mut state = self.state();
        if state.sort != sort {
            state.sort = sort;
            state.invalidate_view();
        }
    }

    /// Replace the active filter with a named preset (`today`, `week`, ...).
    pub fn apply_quick_filter(&self, key: &str) {
        debug!("[JourneyStore] Applying quick filter '{}'", key);
        self.set_filter(quick_filter(key));
    }

    pub fn clear_filter(&self) {
        self.set_filter(JourneyFilter::default());
    }

    // ========================================================================
    // Remote operations
    // ========================================================================

    /// Reload the full journey list.
    pub async fn refresh(&self) -> Result<()> {
        let api = Arc::clone(&self.api);
        self.run("refresh", async move { api.list().await }).await
    }

    /// Placeholder for pagination; the API serves the full list in one page.
    pub async fn load_more(&self) -> Result<()> {
        debug!("[JourneyStore] load_more: pagination is not implemented");
        Ok(())
    }

    /// Create a journey, then reload the list.
    pub async fn create_journey(&self, input: JourneyInput) -> Result<()> {
        if let Err(e) = input.validate() {
            return Err(self.record_failure("create", e));
        }

        let api = Arc::clone(&self.api);
        self.run("create", async move {
            api.create(&input).await?;
            api.list().await
        })
        .await
    }

    /// Update a journey, then reload the list.
    pub async fn update_journey(&self, id: &str, patch: JourneyPatch) -> Result<()> {
        let checked = if id.trim().is_empty() {
            Err(GiroError::Validation {
                errors: vec!["journey id is required".to_string()],
            })
        } else {
            patch.validate()
        };
        if let Err(e) = checked {
            return Err(self.record_failure("update", e));
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        self.run("update", async move {
            api.update(&id, &patch).await?;
            api.list().await
        })
        .await
    }

    /// Delete a journey, then reload the list.
    pub async fn delete_journey(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            let e = GiroError::Validation {
                errors: vec!["journey id is required".to_string()],
            };
            return Err(self.record_failure("delete", e));
        }

        let api = Arc::clone(&self.api);
        let id = id.to_string();
        self.run("delete", async move {
            api.delete(&id).await?;
            api.list().await
        })
        .await
    }

    /// Abandon in-flight operations. The store stays usable.
    pub fn cancel_pending(&self) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.cancel();
        *current = self.lifetime.child_token();
        debug!("[JourneyStore] Pending operations cancelled");
    }

    /// Abandon in-flight operations and refuse new ones.
    pub fn shutdown(&self) {
        if !self.lifetime.is_cancelled() {
            info!("[JourneyStore] Shutting down");
            self.lifetime.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Run one remote operation ending in a full list, then publish it.
    async fn run<F>(&self, label: &str, operation: F) -> Result<()>
    where
        F: Future<Output = Result<Vec<Journey>>> + Send,
    {
        let token = self.operation_token();
        let _pending = PendingGuard::new(self);

        let _turn = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(GiroError::Cancelled),
            turn = self.gate.lock() => turn,
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(GiroError::Cancelled),
            result = operation => result,
        };

        let mut state = self.state();
        match outcome {
            Ok(_) if token.is_cancelled() => {
                debug!("[JourneyStore] {} finished after cancellation, dropped", label);
                Err(GiroError::Cancelled)
            }
            Ok(journeys) => {
                info!("[JourneyStore] {}: {} journeys loaded", label, journeys.len());
                state.raw = journeys;
                state.error = None;
                state.invalidate_view();
                Ok(())
            }
            Err(GiroError::Cancelled) => {
                debug!("[JourneyStore] {} cancelled", label);
                Err(GiroError::Cancelled)
            }
            Err(e) => {
                warn!("[JourneyStore] {} failed: {}", label, e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn record_failure(&self, label: &str, error: GiroError) -> GiroError {
        warn!("[JourneyStore] {} rejected: {}", label, error);
        self.state().error = Some(error.to_string());
        error
    }
}

/// Counts one remote operation as pending until dropped, including when the
/// caller abandons the future.
struct PendingGuard<'a> {
    store: &'a JourneyStore,
}

impl<'a> PendingGuard<'a> {
    fn new(store: &'a JourneyStore) -> Self {
        store.state().pending += 1;
        Self { store }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state();
        state.pending = state.pending.saturating_sub(1);
    }
}

impl Drop for JourneyStore {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::tests::make_journey;
    use crate::journey::JourneyStatus;
    use crate::sort::SortField;
    use async_trait::async_trait;

    /// Serves a fixed list and rejects every mutation.
    struct FixedApi(Vec<Journey>);

    #[async_trait]
    impl JourneyApi for FixedApi {
        async fn list(&self) -> Result<Vec<Journey>> {
            Ok(self.0.clone())
        }

        async fn create(&self, _input: &JourneyInput) -> Result<()> {
            Err(GiroError::Api {
                message: "read only".to_string(),
                status_code: Some(403),
            })
        }

        async fn update(&self, _id: &str, _patch: &JourneyPatch) -> Result<()> {
            Err(GiroError::Api {
                message: "read only".to_string(),
                status_code: Some(403),
            })
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Err(GiroError::Api {
                message: "read only".to_string(),
                status_code: Some(403),
            })
        }
    }

    /// Each list call waits for one released permit.
    struct HeldApi {
        releases: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl JourneyApi for HeldApi {
        async fn list(&self) -> Result<Vec<Journey>> {
            let permit = self.releases.acquire().await.map_err(|e| GiroError::Http {
                message: e.to_string(),
            })?;
            permit.forget();
            Ok(vec![make_journey("a", 1.0, JourneyStatus::Completed)])
        }

        async fn create(&self, _input: &JourneyInput) -> Result<()> {
            Ok(())
        }

        async fn update(&self, _id: &str, _patch: &JourneyPatch) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn store_with(journeys: Vec<Journey>) -> JourneyStore {
        JourneyStore::new(Arc::new(FixedApi(journeys)))
    }

    #[tokio::test]
    async fn test_view_follows_filter_and_sort() {
        let store = store_with(vec![
            make_journey("a", 30.0, JourneyStatus::Completed),
            make_journey("b", 10.0, JourneyStatus::Completed),
            make_journey("c", 20.0, JourneyStatus::Cancelled),
        ]);
        store.refresh().await.unwrap();
        assert_eq!(store.total_count(), 3);

        store.set_sort(JourneySortOption::asc(SortField::Distance));
        let ids: Vec<String> = store.journeys().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(store.metrics().total_distance, 40.0);

        store.apply_quick_filter("completed");
        let ids: Vec<String> = store.journeys().into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["b", "a"]);

        store.clear_filter();
        assert_eq!(store.journeys().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_loaded_list() {
        let store = store_with(vec![make_journey("a", 30.0, JourneyStatus::Completed)]);
        store.refresh().await.unwrap();

        let err = store.delete_journey("a").await.unwrap_err();
        assert_eq!(err.to_string(), "read only");
        assert_eq!(store.error().as_deref(), Some("read only"));
        assert_eq!(store.journeys().len(), 1);
        assert!(!store.loading());

        // Next success clears the error
        store.refresh().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_locally() {
        let store = store_with(vec![]);
        assert!(matches!(
            store.delete_journey(" ").await,
            Err(GiroError::Validation { .. })
        ));
        assert!(matches!(
            store.update_journey("", JourneyPatch::default()).await,
            Err(GiroError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_operations_after_shutdown_are_cancelled() {
        let store = store_with(vec![make_journey("a", 1.0, JourneyStatus::Completed)]);
        store.shutdown();
        assert!(store.is_shut_down());
        assert!(matches!(store.refresh().await, Err(GiroError::Cancelled)));
        assert_eq!(store.total_count(), 0);
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_cancel_pending_keeps_store_usable() {
        let store = store_with(vec![make_journey("a", 1.0, JourneyStatus::Completed)]);
        store.cancel_pending();
        store.refresh().await.unwrap();
        assert_eq!(store.total_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_consistent() {
        let store = store_with(vec![make_journey("a", 12.0, JourneyStatus::Completed)]);
        store.refresh().await.unwrap();
        let view = store.snapshot();
        assert_eq!(view.journeys.len(), 1);
        assert_eq!(view.metrics.total_distance, 12.0);
        assert!(!view.loading);
        assert_eq!(view.sort, JourneySortOption::default());
        assert!(store.load_more().await.is_ok());
    }

    #[tokio::test]
    async fn test_loading_covers_queued_operations() {
        let api = Arc::new(HeldApi {
            releases: tokio::sync::Semaphore::new(0),
        });
        let store = Arc::new(JourneyStore::new(api.clone()));
        assert!(!store.loading());

        let spawn_refresh = || {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.refresh().await })
        };
        let first = spawn_refresh();
        let second = spawn_refresh();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(store.loading());

        // Let exactly one operation finish
        api.releases.add_permits(1);
        while !first.is_finished() && !second.is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        // The other one is still queued or waiting on the API
        assert!(store.loading());
        assert!(store.snapshot().loading);

        api.releases.add_permits(1);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert!(!store.loading());
        assert_eq!(store.total_count(), 1);
    }
}
