//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the journey pipeline
//! to Kotlin and Swift. Journeys, filters and results cross the boundary as
//! JSON strings in the same camelCase shape the REST API uses, so the app
//! can hand over what it fetched without remapping. Malformed JSON is
//! reported as an [`FfiError`], never replaced by a default.
//!
//! Stateless helpers are prefixed with `ffi_` to avoid naming conflicts with
//! the internal API. [`FfiJourneyStore`] wraps the stateful
//! [`JourneyStore`] and drives its async operations on an owned runtime, so
//! the app calls it from a background thread like any blocking API.

use std::sync::Arc;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::achievements::detect_achievements;
use crate::config::ApiConfig;
use crate::error::GiroError;
use crate::filter::{apply_filter, JourneyFilter};
use crate::http::HttpJourneyApi;
use crate::init_logging;
use crate::journey::{Journey, JourneyInput, JourneyPatch};
use crate::metrics::{compute_metrics_with, MetricsConfig};
use crate::parsing::parse_duration;
use crate::quick_filter::quick_filter;
use crate::sort::{apply_sort, JourneySortOption};
use crate::store::JourneyStore;

/// Error surfaced to Kotlin/Swift as an exception carrying its message.
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum FfiError {
    #[error("Invalid {what} JSON: {message}")]
    InvalidJson { what: String, message: String },
    #[error("Operation cancelled")]
    Cancelled,
    #[error("{message}")]
    Failed { message: String },
}

impl From<GiroError> for FfiError {
    fn from(error: GiroError) -> Self {
        match error {
            GiroError::Cancelled => FfiError::Cancelled,
            other => FfiError::Failed {
                message: other.to_string(),
            },
        }
    }
}

fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, FfiError> {
    serde_json::from_str(json).map_err(|e| {
        warn!("[GiroFFI] Invalid {} JSON: {}", what, e);
        FfiError::InvalidJson {
            what: what.to_string(),
            message: e.to_string(),
        }
    })
}

/// Like [`from_json`], but a blank string stands for "not set".
fn from_optional_json<T>(what: &str, json: &str) -> Result<T, FfiError>
where
    T: DeserializeOwned + Default,
{
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    from_json(what, json)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, FfiError> {
    serde_json::to_string(value).map_err(|e| FfiError::Failed {
        message: format!("Failed to encode result: {}", e),
    })
}

/// Filter a JSON journey array with a JSON filter (blank for no filter).
#[uniffi::export]
pub fn ffi_filter_journeys(
    journeys_json: String,
    filter_json: String,
) -> Result<String, FfiError> {
    init_logging();
    let journeys: Vec<Journey> = from_json("journeys", &journeys_json)?;
    let filter: JourneyFilter = from_optional_json("filter", &filter_json)?;
    let result = apply_filter(&journeys, &filter);
    info!(
        "[GiroFFI] Filtered {} journeys down to {}",
        journeys.len(),
        result.len()
    );
    to_json(&result)
}

/// Sort a JSON journey array. A blank sort means newest first.
#[uniffi::export]
pub fn ffi_sort_journeys(journeys_json: String, sort_json: String) -> Result<String, FfiError> {
    init_logging();
    let journeys: Vec<Journey> = from_json("journeys", &journeys_json)?;
    let sort: JourneySortOption = from_optional_json("sort", &sort_json)?;
    to_json(&apply_sort(&journeys, &sort))
}

/// Compute metrics for a JSON journey array.
#[uniffi::export]
pub fn ffi_compute_metrics(
    journeys_json: String,
    co2_kg_per_km: Option<f64>,
) -> Result<String, FfiError> {
    init_logging();
    let journeys: Vec<Journey> = from_json("journeys", &journeys_json)?;
    let config = co2_kg_per_km
        .map(MetricsConfig::with_co2_factor)
        .unwrap_or_default();
    to_json(&compute_metrics_with(&journeys, &config))
}

/// Expand a quick-filter key into a JSON filter.
#[uniffi::export]
pub fn ffi_quick_filter(key: String) -> Result<String, FfiError> {
    init_logging();
    to_json(&quick_filter(&key))
}

/// Detect achievements for a JSON journey against a JSON history.
#[uniffi::export]
pub fn ffi_detect_achievements(
    journey_json: String,
    history_json: String,
) -> Result<String, FfiError> {
    init_logging();
    let journey: Journey = from_json("journey", &journey_json)?;
    let history: Vec<Journey> = from_json("history", &history_json)?;
    let achievements = detect_achievements(&journey, &history);
    info!(
        "[GiroFFI] Detected {} achievements for journey {}",
        achievements.len(),
        journey.id
    );
    to_json(&achievements)
}

/// Parse an `Xh Ymin` duration; `None` when malformed.
#[uniffi::export]
pub fn ffi_parse_duration(duration: String) -> Option<u32> {
    parse_duration(&duration).ok()
}

// ============================================================================
// Journey Store
// ============================================================================

/// Journey store bound to the GiroPro REST API.
///
/// Remote operations block the calling thread until they finish or are
/// cancelled from another thread with `cancel_pending` / `shutdown`.
#[derive(uniffi::Object)]
pub struct FfiJourneyStore {
    runtime: Runtime,
    store: JourneyStore,
}

#[uniffi::export]
impl FfiJourneyStore {
    #[uniffi::constructor]
    pub fn new(base_url: String, auth_token: Option<String>) -> Result<Arc<Self>, FfiError> {
        init_logging();

        let mut config = ApiConfig::new(base_url);
        config.auth_token = auth_token.filter(|t| !t.is_empty());
        let api = HttpJourneyApi::new(config)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| FfiError::Failed {
                message: format!("Runtime error: {}", e),
            })?;

        info!("[GiroFFI] Journey store created for {}", api.config().base_url);
        Ok(Arc::new(Self {
            runtime,
            store: JourneyStore::new(Arc::new(api)),
        }))
    }

    pub fn refresh(&self) -> Result<(), FfiError> {
        Ok(self.runtime.block_on(self.store.refresh())?)
    }

    pub fn load_more(&self) -> Result<(), FfiError> {
        Ok(self.runtime.block_on(self.store.load_more())?)
    }

    pub fn create_journey(&self, input_json: String) -> Result<(), FfiError> {
        let input: JourneyInput = from_json("journey input", &input_json)?;
        Ok(self.runtime.block_on(self.store.create_journey(input))?)
    }

    pub fn update_journey(&self, id: String, patch_json: String) -> Result<(), FfiError> {
        let patch: JourneyPatch = from_json("journey patch", &patch_json)?;
        Ok(self.runtime.block_on(self.store.update_journey(&id, patch))?)
    }

    pub fn delete_journey(&self, id: String) -> Result<(), FfiError> {
        Ok(self.runtime.block_on(self.store.delete_journey(&id))?)
    }

    /// Replace the filter; a blank string clears it.
    pub fn set_filter(&self, filter_json: String) -> Result<(), FfiError> {
        let filter: JourneyFilter = from_optional_json("filter", &filter_json)?;
        self.store.set_filter(filter);
        Ok(())
    }

    /// Replace the sort; a blank string restores newest first.
    pub fn set_sort(&self, sort_json: String) -> Result<(), FfiError> {
        let sort: JourneySortOption = from_optional_json("sort", &sort_json)?;
        self.store.set_sort(sort);
        Ok(())
    }

    pub fn apply_quick_filter(&self, key: String) {
        self.store.apply_quick_filter(&key);
    }

    pub fn clear_filter(&self) {
        self.store.clear_filter();
    }

    /// Filtered and sorted journeys as a JSON array.
    pub fn journeys(&self) -> Result<String, FfiError> {
        to_json(&self.store.journeys())
    }

    pub fn metrics(&self) -> Result<String, FfiError> {
        to_json(&self.store.metrics())
    }

    /// Journeys, metrics, loading, error, filter and sort as one JSON object.
    pub fn snapshot(&self) -> Result<String, FfiError> {
        to_json(&self.store.snapshot())
    }

    pub fn loading(&self) -> bool {
        self.store.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.store.error()
    }

    pub fn total_count(&self) -> u64 {
        self.store.total_count() as u64
    }

    pub fn cancel_pending(&self) {
        self.store.cancel_pending();
    }

    pub fn shutdown(&self) {
        self.store.shutdown();
    }
}
