//! # GiroPro Journeys
//!
//! Journey tracking core for the GiroPro driver app.
//!
//! This library provides:
//! - Parsing of the app's `DD/MM/YYYY HH:mm` dates and `Xh Ymin` durations
//! - Journey filtering, sorting and summary metrics
//! - Quick-filter presets (`today`, `week`, `month`, ...)
//! - A journey store backed by the GiroPro REST API
//! - Achievement detection for completed journeys
//!
//! ## Features
//!
//! - **`http`** (default) - Enable the reqwest client for the journeys API
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android); implies `http`
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use giropro_journeys::{
//!     apply_filter, apply_sort, compute_metrics, Journey, JourneyFilter, JourneySortOption,
//!     SortField,
//! };
//!
//! let journeys: Vec<Journey> = Vec::new(); // as fetched from GET /journeys
//!
//! let filter = JourneyFilter::default().with_distance(Some(5.0), None);
//! let visible = apply_sort(
//!     &apply_filter(&journeys, &filter),
//!     &JourneySortOption::desc(SortField::Distance),
//! );
//! let metrics = compute_metrics(&visible);
//! println!("{:.1} km driven", metrics.total_distance);
//! ```

// Unified error handling
pub mod error;
pub use error::{GiroError, ParseError, Result};

// Journey records and API payloads
pub mod journey;
pub use journey::{Journey, JourneyInput, JourneyPatch, JourneyStatus, RoutePoint};

// Date/duration parsing
pub mod parsing;
pub use parsing::{format_duration, format_journey_date, parse_duration, parse_journey_date};

// Filter engine
pub mod filter;
pub use filter::{apply_filter, DateRange, JourneyFilter};

// Sort engine
pub mod sort;
pub use sort::{apply_sort, JourneySortOption, SortDirection, SortField};

// Metrics aggregation
pub mod metrics;
pub use metrics::{
    compute_metrics, compute_metrics_by_vehicle, compute_metrics_with, JourneyMetrics,
    MetricsConfig,
};

// Quick-filter presets
pub mod quick_filter;
pub use quick_filter::{quick_filter, quick_filter_at, QuickFilter};

// Achievement detection
pub mod achievements;
pub use achievements::{detect_achievements, Achievement, AchievementType};

// API configuration
pub mod config;
pub use config::ApiConfig;

// REST contract
pub mod api;
pub use api::JourneyApi;

// HTTP client for the journeys API
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::HttpJourneyApi;

// Journey store (filtered view + remote operations)
pub mod store;
pub use store::{JourneyStore, JourneyView};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("GiroProRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}
