//! Journey sort engine.
//!
//! Each [`SortField`] maps to a typed key accessor, so adding a sortable
//! field means adding an enum variant and its arm in [`SortField::key`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GiroError, Result};
use crate::journey::Journey;
use crate::parsing::{parse_duration, parse_journey_date};

/// Field a journey list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Date,
    Distance,
    Duration,
    Cost,
    FuelConsumption,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Date,
        SortField::Distance,
        SortField::Duration,
        SortField::Cost,
        SortField::FuelConsumption,
    ];

    /// Extract the comparable key for this field.
    ///
    /// `None` when a date or duration fails to parse.
    pub fn key(&self, journey: &Journey) -> Option<f64> {
        match self {
            SortField::Date => parse_journey_date(&journey.date)
                .ok()
                .map(|d| d.and_utc().timestamp() as f64),
            SortField::Distance => Some(journey.distance),
            SortField::Duration => parse_duration(&journey.duration).ok().map(f64::from),
            SortField::Cost => Some(journey.cost),
            SortField::FuelConsumption => Some(journey.fuel_consumption),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Distance => "distance",
            SortField::Duration => "duration",
            SortField::Cost => "cost",
            SortField::FuelConsumption => "fuelConsumption",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = GiroError;

    fn from_str(s: &str) -> Result<Self> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| GiroError::Validation {
                errors: vec![format!("unknown sort field '{}'", s)],
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Active ordering of the journey view. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneySortOption {
    pub field: SortField,
    pub direction: SortDirection,
}

impl JourneySortOption {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Compare two extracted keys. Missing keys go last in either direction.
    fn compare(&self, a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => match self.direction {
                SortDirection::Asc => a.total_cmp(&b),
                SortDirection::Desc => b.total_cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl Default for JourneySortOption {
    fn default() -> Self {
        Self::desc(SortField::Date)
    }
}

/// Return a sorted copy of `journeys`. The input is left untouched.
///
/// The sort is stable: journeys with equal keys keep their input order.
pub fn apply_sort(journeys: &[Journey], sort_by: &JourneySortOption) -> Vec<Journey> {
    // Extract keys once; date/duration keys need parsing
    let mut keyed: Vec<(Option<f64>, &Journey)> = journeys
        .iter()
        .map(|j| (sort_by.field.key(j), j))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| sort_by.compare(*a, *b));

    keyed.into_iter().map(|(_, j)| j.clone()).collect()
}
