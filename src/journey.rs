//! Journey records as served by the GiroPro API, plus the payloads used to
//! create and update them.
//!
//! Records are decoded from camelCase JSON. Dates and durations are kept in
//! their locale-formatted string form (`DD/MM/YYYY HH:mm`, `Xh Ymin`) and
//! parsed on demand by [`crate::parsing`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GiroError, Result};
use crate::parsing::{parse_duration, parse_journey_date};

/// Lifecycle state of a journey. Owned by the API; never changed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Completed,
    InProgress,
    Paused,
    Cancelled,
    Planned,
}

impl JourneyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JourneyStatus::Completed => "completed",
            JourneyStatus::InProgress => "in_progress",
            JourneyStatus::Paused => "paused",
            JourneyStatus::Cancelled => "cancelled",
            JourneyStatus::Planned => "planned",
        }
    }
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JourneyStatus {
    type Err = GiroError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(JourneyStatus::Completed),
            "in_progress" => Ok(JourneyStatus::InProgress),
            "paused" => Ok(JourneyStatus::Paused),
            "cancelled" => Ok(JourneyStatus::Cancelled),
            "planned" => Ok(JourneyStatus::Planned),
            other => Err(GiroError::Validation {
                errors: vec![format!("unknown journey status '{}'", other)],
            }),
        }
    }
}

/// A recorded position along a journey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Speed in km/h, when the device reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl RoutePoint {
    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A single trip record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: String,
    pub title: String,
    pub origin: String,
    pub destination: String,
    /// Distance in kilometers
    pub distance: f64,
    /// Liters per 100 km
    pub fuel_consumption: f64,
    pub cost: f64,
    /// `DD/MM/YYYY HH:mm`
    pub date: String,
    /// `Xh Ymin`
    pub duration: String,
    pub status: JourneyStatus,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RoutePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<serde_json::Value>,
}

impl Journey {
    pub fn is_completed(&self) -> bool {
        self.status == JourneyStatus::Completed
    }
}

/// Payload for `POST /journeys`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyInput {
    pub title: String,
    pub origin: String,
    pub destination: String,
    pub distance: f64,
    pub fuel_consumption: f64,
    pub cost: f64,
    pub date: String,
    pub duration: String,
    pub status: JourneyStatus,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RoutePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl JourneyInput {
    /// Check every field the journey form requires.
    ///
    /// Collects all problems rather than stopping at the first one so the
    /// form can flag each field at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("title is required".to_string());
        }
        if self.origin.trim().is_empty() {
            errors.push("origin is required".to_string());
        }
        if self.destination.trim().is_empty() {
            errors.push("destination is required".to_string());
        }
        if self.vehicle_id.trim().is_empty() {
            errors.push("vehicleId is required".to_string());
        }
        check_non_negative(&mut errors, "distance", self.distance);
        check_non_negative(&mut errors, "fuelConsumption", self.fuel_consumption);
        check_non_negative(&mut errors, "cost", self.cost);
        if let Err(e) = parse_journey_date(&self.date) {
            errors.push(e.to_string());
        }
        if let Err(e) = parse_duration(&self.duration) {
            errors.push(e.to_string());
        }
        if self.route.iter().any(|p| !p.is_valid()) {
            errors.push("route contains invalid coordinates".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GiroError::Validation { errors })
        }
    }
}

/// Payload for `PUT /journeys/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JourneyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl JourneyPatch {
    /// Check the fields that are present.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            errors.push("title must not be empty".to_string());
        }
        if matches!(&self.vehicle_id, Some(v) if v.trim().is_empty()) {
            errors.push("vehicleId must not be empty".to_string());
        }
        if let Some(distance) = self.distance {
            check_non_negative(&mut errors, "distance", distance);
        }
        if let Some(consumption) = self.fuel_consumption {
            check_non_negative(&mut errors, "fuelConsumption", consumption);
        }
        if let Some(cost) = self.cost {
            check_non_negative(&mut errors, "cost", cost);
        }
        if let Some(date) = &self.date {
            if let Err(e) = parse_journey_date(date) {
                errors.push(e.to_string());
            }
        }
        if let Some(duration) = &self.duration {
            if let Err(e) = parse_duration(duration) {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GiroError::Validation { errors })
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == JourneyPatch::default()
    }
}

fn check_non_negative(errors: &mut Vec<String>, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{} must be a non-negative number", field));
    }
}
