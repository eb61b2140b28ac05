//! Journey filter engine.
//!
//! A [`JourneyFilter`] is a set of optional dimensions. Each present
//! dimension narrows the working set; a journey survives only if it
//! satisfies all of them.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::journey::{Journey, JourneyStatus};
use crate::parsing::parse_journey_date;

/// Inclusive range of local wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: &NaiveDateTime) -> bool {
        *date >= self.start && *date <= self.end
    }
}

/// Criteria for narrowing a journey list. Absent fields don't constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BTreeSet<JourneyStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_ids: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_ids: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl JourneyFilter {
    /// True when no dimension is active.
    pub fn is_empty(&self) -> bool {
        *self == JourneyFilter::default()
    }

    pub fn with_date_range(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_status<I: IntoIterator<Item = JourneyStatus>>(mut self, statuses: I) -> Self {
        self.status = Some(statuses.into_iter().collect());
        self
    }

    pub fn with_vehicles<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vehicle_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_drivers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.driver_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_distance(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn with_cost(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_cost = min;
        self.max_cost = max;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a single journey satisfies every active dimension.
    pub fn matches(&self, journey: &Journey) -> bool {
        if let Some(range) = &self.date_range {
            // Unparseable dates can't be placed in any range
            match parse_journey_date(&journey.date) {
                Ok(date) if range.contains(&date) => {}
                _ => return false,
            }
        }

        if let Some(statuses) = &self.status {
            if !statuses.contains(&journey.status) {
                return false;
            }
        }

        if let Some(vehicles) = &self.vehicle_ids {
            if !vehicles.contains(&journey.vehicle_id) {
                return false;
            }
        }

        if let Some(drivers) = &self.driver_ids {
            match &journey.driver_id {
                Some(driver) if drivers.contains(driver) => {}
                _ => return false,
            }
        }

        if !within(journey.distance, self.min_distance, self.max_distance) {
            return false;
        }

        if !within(journey.cost, self.min_cost, self.max_cost) {
            return false;
        }

        if let Some(tags) = &self.tags {
            if journey.tags.is_disjoint(tags) {
                return false;
            }
        }

        true
    }
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Keep the journeys that satisfy every active dimension of `filter`.
///
/// Input order is preserved.
pub fn apply_filter(journeys: &[Journey], filter: &JourneyFilter) -> Vec<Journey> {
    if filter.is_empty() {
        return journeys.to_vec();
    }

    let filtered: Vec<Journey> = journeys
        .iter()
        .filter(|j| filter.matches(j))
        .cloned()
        .collect();

    debug!(
        "[Filter] {} of {} journeys match",
        filtered.len(),
        journeys.len()
    );

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::tests::make_journey;
    use crate::parsing::parse_journey_date;

    fn ids(journeys: &[Journey]) -> Vec<&str> {
        journeys.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let journeys = vec![
            make_journey("a", 10.0, JourneyStatus::Completed),
            make_journey("b", 20.0, JourneyStatus::Planned),
        ];
        let result = apply_filter(&journeys, &JourneyFilter::default());
        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[test]
    fn test_dimensions_compose_with_and() {
        let journeys = vec![
            make_journey("a", 10.0, JourneyStatus::Completed),
            make_journey("b", 50.0, JourneyStatus::Completed),
            make_journey("c", 10.0, JourneyStatus::Cancelled),
        ];
        let filter = JourneyFilter::default()
            .with_distance(Some(5.0), None)
            .with_status([JourneyStatus::Completed]);

        let result = apply_filter(&journeys, &filter);
        assert_eq!(ids(&result), vec!["a", "b"]);

        // Equal to the intersection of each dimension applied alone
        let by_distance = apply_filter(
            &journeys,
            &JourneyFilter::default().with_distance(Some(5.0), None),
        );
        let by_status = apply_filter(
            &journeys,
            &JourneyFilter::default().with_status([JourneyStatus::Completed]),
        );
        let intersection: Vec<&str> = ids(&by_distance)
            .into_iter()
            .filter(|id| ids(&by_status).contains(id))
            .collect();
        assert_eq!(ids(&result), intersection);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let mut early = make_journey("early", 1.0, JourneyStatus::Completed);
        early.date = "01/03/2024 00:00".to_string();
        let mut late = make_journey("late", 1.0, JourneyStatus::Completed);
        late.date = "31/03/2024 23:59".to_string();
        let mut outside = make_journey("outside", 1.0, JourneyStatus::Completed);
        outside.date = "01/04/2024 00:00".to_string();
        let mut broken = make_journey("broken", 1.0, JourneyStatus::Completed);
        broken.date = "sometime in march".to_string();

        let filter = JourneyFilter::default().with_date_range(
            parse_journey_date("01/03/2024 00:00").unwrap(),
            parse_journey_date("31/03/2024 23:59").unwrap(),
        );
        let result = apply_filter(&[early, late, outside, broken], &filter);
        assert_eq!(ids(&result), vec!["early", "late"]);
    }

    #[test]
    fn test_vehicle_and_driver_membership() {
        let mut a = make_journey("a", 1.0, JourneyStatus::Completed);
        a.driver_id = Some("d1".to_string());
        let mut b = make_journey("b", 1.0, JourneyStatus::Completed);
        b.vehicle_id = "v2".to_string();
        b.driver_id = Some("d2".to_string());
        let c = make_journey("c", 1.0, JourneyStatus::Completed);

        let journeys = vec![a, b, c];

        let by_vehicle = apply_filter(&journeys, &JourneyFilter::default().with_vehicles(["v1"]));
        assert_eq!(ids(&by_vehicle), vec!["a", "c"]);

        // Journeys without a driver never match a driver filter
        let by_driver = apply_filter(
            &journeys,
            &JourneyFilter::default().with_drivers(["d1", "d2"]),
        );
        assert_eq!(ids(&by_driver), vec!["a", "b"]);
    }

    #[test]
    fn test_numeric_ranges_are_inclusive() {
        let mut cheap = make_journey("cheap", 10.0, JourneyStatus::Completed);
        cheap.cost = 20.0;
        let mut pricey = make_journey("pricey", 30.0, JourneyStatus::Completed);
        pricey.cost = 80.0;

        let journeys = vec![cheap, pricey];
        let filter = JourneyFilter::default()
            .with_distance(Some(10.0), Some(30.0))
            .with_cost(None, Some(20.0));
        assert_eq!(ids(&apply_filter(&journeys, &filter)), vec!["cheap"]);

        let filter = JourneyFilter::default().with_cost(Some(80.0), Some(80.0));
        assert_eq!(ids(&apply_filter(&journeys, &filter)), vec!["pricey"]);
    }

    #[test]
    fn test_tags_match_on_any_overlap() {
        let mut a = make_journey("a", 1.0, JourneyStatus::Completed);
        a.tags = ["work", "urgent"].iter().map(|s| s.to_string()).collect();
        let mut b = make_journey("b", 1.0, JourneyStatus::Completed);
        b.tags = ["personal"].iter().map(|s| s.to_string()).collect();
        let c = make_journey("c", 1.0, JourneyStatus::Completed);

        let filter = JourneyFilter::default().with_tags(["urgent", "airport"]);
        assert_eq!(ids(&apply_filter(&[a, b, c], &filter)), vec!["a"]);
    }

    #[test]
    fn test_empty_status_set_matches_nothing() {
        let journeys = vec![make_journey("a", 1.0, JourneyStatus::Completed)];
        let filter = JourneyFilter::default().with_status(Vec::new());
        assert!(apply_filter(&journeys, &filter).is_empty());
    }

    #[test]
    fn test_filter_deserializes_from_camel_case() {
        let filter: JourneyFilter = serde_json::from_str(
            r#"{"status": ["completed"], "minDistance": 5.0, "vehicleIds": ["v1"]}"#,
        )
        .unwrap();
        assert_eq!(filter.min_distance, Some(5.0));
        assert!(filter.status.unwrap().contains(&JourneyStatus::Completed));
    }
}
