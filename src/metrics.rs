//! Summary statistics over completed journeys.
//!
//! Only journeys with status `completed` contribute; anything in progress,
//! paused, planned or cancelled is ignored regardless of the active filter.
//!
//! ## Example
//! ```rust
//! use giropro_journeys::metrics::compute_metrics;
//!
//! let metrics = compute_metrics(&[]);
//! assert_eq!(metrics.total_distance, 0.0);
//! assert_eq!(metrics.average_speed, 0.0);
//! ```

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::journey::Journey;
use crate::parsing::parse_duration;

/// Default CO2 estimate per kilometer driven.
pub const DEFAULT_CO2_KG_PER_KM: f64 = 0.12;

/// Configuration for metrics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    /// Emission factor used for the CO2 estimate (kg per km)
    pub co2_kg_per_km: f64,
}

impl MetricsConfig {
    pub fn with_co2_factor(co2_kg_per_km: f64) -> Self {
        Self { co2_kg_per_km }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::with_co2_factor(DEFAULT_CO2_KG_PER_KM)
    }
}

/// Aggregate statistics for a journey list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyMetrics {
    /// Kilometers
    pub total_distance: f64,
    /// Minutes
    pub total_duration: u32,
    /// Mean liters per 100 km
    pub average_fuel_consumption: f64,
    pub total_cost: f64,
    /// km/h; 0 when no time was recorded
    pub average_speed: f64,
    /// Estimated kilograms of CO2
    pub co2_emissions: f64,
}

/// Compute metrics with the default emission factor.
pub fn compute_metrics(journeys: &[Journey]) -> JourneyMetrics {
    compute_metrics_with(journeys, &MetricsConfig::default())
}

/// Compute metrics over the completed subset of `journeys`.
pub fn compute_metrics_with(journeys: &[Journey], config: &MetricsConfig) -> JourneyMetrics {
    let completed: Vec<&Journey> = journeys.iter().filter(|j| j.is_completed()).collect();
    if completed.is_empty() {
        return JourneyMetrics::default();
    }

    let mut total_distance = 0.0;
    let mut total_duration: u32 = 0;
    let mut total_cost = 0.0;
    let mut consumption_sum = 0.0;

    for journey in &completed {
        total_distance += journey.distance;
        total_cost += journey.cost;
        consumption_sum += journey.fuel_consumption;

        match parse_duration(&journey.duration) {
            Ok(minutes) => total_duration = total_duration.saturating_add(minutes),
            Err(e) => warn!("[Metrics] Counting journey {} as 0 minutes: {}", journey.id, e),
        }
    }

    // No recorded time means no meaningful speed
    let average_speed = if total_duration > 0 {
        total_distance / (total_duration as f64 / 60.0)
    } else {
        0.0
    };

    JourneyMetrics {
        total_distance,
        total_duration,
        average_fuel_consumption: consumption_sum / completed.len() as f64,
        total_cost,
        average_speed,
        co2_emissions: total_distance * config.co2_kg_per_km,
    }
}

/// Metrics per vehicle, keyed by vehicle id.
///
/// Vehicles whose journeys are all incomplete still get an (all zero) entry
/// so the fleet overview lists every vehicle in the input.
pub fn compute_metrics_by_vehicle(
    journeys: &[Journey],
    config: &MetricsConfig,
) -> BTreeMap<String, JourneyMetrics> {
    let mut by_vehicle: BTreeMap<&str, Vec<Journey>> = BTreeMap::new();
    for journey in journeys {
        by_vehicle
            .entry(journey.vehicle_id.as_str())
            .or_default()
            .push(journey.clone());
    }

    by_vehicle
        .into_iter()
        .map(|(vehicle, list)| (vehicle.to_string(), compute_metrics_with(&list, config)))
        .collect()
}
