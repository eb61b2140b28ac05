//! Named filter shortcuts shown as chips above the journey list.
//!
//! Each preset expands to a full [`JourneyFilter`] relative to the moment it
//! is requested. Date presets use local wall-clock time, the same clock the
//! journeys' `DD/MM/YYYY HH:mm` dates are recorded in.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::GiroError;
use crate::filter::JourneyFilter;
use crate::journey::JourneyStatus;

/// The closed set of quick-filter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickFilter {
    /// From local midnight today to midnight tomorrow
    Today,
    /// From the most recent Sunday at midnight to now
    Week,
    /// From the first of the month at midnight to now
    Month,
    Completed,
    InProgress,
}

impl QuickFilter {
    pub const ALL: [QuickFilter; 5] = [
        QuickFilter::Today,
        QuickFilter::Week,
        QuickFilter::Month,
        QuickFilter::Completed,
        QuickFilter::InProgress,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            QuickFilter::Today => "today",
            QuickFilter::Week => "week",
            QuickFilter::Month => "month",
            QuickFilter::Completed => "completed",
            QuickFilter::InProgress => "in_progress",
        }
    }

    /// Expand the preset relative to `now`.
    pub fn to_filter_at(&self, now: NaiveDateTime) -> JourneyFilter {
        let midnight = now.date().and_time(NaiveTime::MIN);

        match self {
            QuickFilter::Today => {
                JourneyFilter::default().with_date_range(midnight, midnight + Duration::hours(24))
            }
            QuickFilter::Week => {
                let since_sunday = now.date().weekday().num_days_from_sunday() as i64;
                JourneyFilter::default()
                    .with_date_range(midnight - Duration::days(since_sunday), now)
            }
            QuickFilter::Month => {
                let first = midnight - Duration::days(now.day0() as i64);
                JourneyFilter::default().with_date_range(first, now)
            }
            QuickFilter::Completed => {
                JourneyFilter::default().with_status([JourneyStatus::Completed])
            }
            QuickFilter::InProgress => {
                JourneyFilter::default().with_status([JourneyStatus::InProgress])
            }
        }
    }

    /// Expand the preset relative to the current local time.
    pub fn to_filter(&self) -> JourneyFilter {
        self.to_filter_at(Local::now().naive_local())
    }
}

impl fmt::Display for QuickFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for QuickFilter {
    type Err = GiroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuickFilter::ALL
            .into_iter()
            .find(|q| q.key() == s)
            .ok_or_else(|| GiroError::Validation {
                errors: vec![format!("unknown quick filter '{}'", s)],
            })
    }
}

/// Filter for a preset key, relative to the current local time.
///
/// Unknown keys yield an empty filter (no constraints).
pub fn quick_filter(key: &str) -> JourneyFilter {
    quick_filter_at(key, Local::now().naive_local())
}

/// Filter for a preset key, relative to `now`.
pub fn quick_filter_at(key: &str, now: NaiveDateTime) -> JourneyFilter {
    match key.parse::<QuickFilter>() {
        Ok(preset) => preset.to_filter_at(now),
        Err(_) => JourneyFilter::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_journey_date;

    fn at(s: &str) -> NaiveDateTime {
        parse_journey_date(s).unwrap()
    }

    #[test]
    fn test_today_spans_exactly_one_day() {
        let filter = quick_filter_at("today", at("17/10/2024 15:42"));
        let range = filter.date_range.unwrap();
        assert_eq!(range.start, at("17/10/2024 00:00"));
        assert_eq!(range.end - range.start, Duration::hours(24));
        assert!(filter.status.is_none());
    }

    #[test]
    fn test_today_with_local_clock() {
        let range = quick_filter("today").date_range.unwrap();
        assert_eq!(range.start.time(), NaiveTime::MIN);
        assert_eq!(range.end - range.start, Duration::hours(24));
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 17/10/2024 is a Thursday
        let now = at("17/10/2024 15:42");
        let range = quick_filter_at("week", now).date_range.unwrap();
        assert_eq!(range.start, at("13/10/2024 00:00"));
        assert_eq!(range.end, now);

        // On a Sunday the week starts that same midnight
        let sunday = at("13/10/2024 09:00");
        let range = quick_filter_at("week", sunday).date_range.unwrap();
        assert_eq!(range.start, at("13/10/2024 00:00"));
    }

    #[test]
    fn test_month_starts_on_the_first() {
        let now = at("17/10/2024 15:42");
        let range = quick_filter_at("month", now).date_range.unwrap();
        assert_eq!(range.start, at("01/10/2024 00:00"));
        assert_eq!(range.end, now);
    }

    #[test]
    fn test_status_presets() {
        let now = at("17/10/2024 15:42");
        let completed = quick_filter_at("completed", now);
        assert!(completed.date_range.is_none());
        assert_eq!(
            completed.status.unwrap().into_iter().collect::<Vec<_>>(),
            vec![JourneyStatus::Completed]
        );

        let in_progress = quick_filter_at("in_progress", now);
        assert!(in_progress.status.unwrap().contains(&JourneyStatus::InProgress));
    }

    #[test]
    fn test_unknown_key_is_empty_filter() {
        assert!(quick_filter("yesterday").is_empty());
        assert!(quick_filter("").is_empty());
    }
}
