//! Achievement detection for completed journeys.
//!
//! Compares a newly completed journey against the driver's history to award
//! records, milestones and streaks. Only completed journeys count, on both
//! sides of the comparison.
//!
//! ## Features
//! - First completed journey
//! - Longest journey and longest time behind the wheel of the year
//! - Most fuel-efficient journey
//! - Journey count and total distance milestones
//! - Consecutive day streaks
//!
//! ## Example
//! ```rust,ignore
//! use giropro_journeys::achievements::detect_achievements;
//!
//! let achievements = detect_achievements(&finished_journey, &store.journeys());
//! for a in &achievements {
//!     println!("{} ({})", a.title, a.value);
//! }
//! ```

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::journey::Journey;
use crate::parsing::{format_duration, parse_duration, parse_journey_date};

/// Type of achievement detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    /// First completed journey
    FirstJourney,
    /// Longest journey of the year (by distance)
    LongestJourney,
    /// Longest journey of the year (by duration)
    LongestDuration,
    /// Lowest fuel consumption on a journey of meaningful length
    BestConsumption,
    /// Reached a milestone (100 journeys, 1000km, etc.)
    Milestone,
    /// Consecutive days with a completed journey
    Streak,
}

/// An achievement detected from journey analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub achievement_type: AchievementType,
    /// Human-readable title
    pub title: String,
    pub description: String,
    /// The value that triggered the achievement (e.g., "412.0km" or "6.8 L/100km")
    pub value: String,
    /// Previous best value (if applicable)
    pub previous_best: Option<String>,
    /// Improvement percentage (if applicable)
    pub improvement_percent: Option<f64>,
    pub journey_id: String,
    /// Journey date, `DD/MM/YYYY HH:mm`
    pub date: String,
    /// Importance score (higher = more significant)
    pub importance: u8,
}

/// Minimum distance (km) for a journey to compete on consumption
const CONSUMPTION_MIN_DISTANCE_KM: f64 = 20.0;
/// Minimum distance (km) for a yearly distance record
const LONGEST_MIN_DISTANCE_KM: f64 = 10.0;
/// Minimum duration (minutes) for a yearly duration record
const LONGEST_MIN_DURATION_MIN: u32 = 60;

const COUNT_MILESTONES: [usize; 7] = [10, 25, 50, 100, 250, 500, 1000];
const DISTANCE_MILESTONES_KM: [f64; 7] = [100.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 50000.0];
const STREAK_MILESTONES: [u32; 4] = [3, 7, 14, 30];

/// Detect achievements earned by `new_journey`.
///
/// `history` may include `new_journey` itself; it is skipped by id.
/// Returns nothing unless `new_journey` is completed. Results are sorted by
/// importance, highest first.
pub fn detect_achievements(new_journey: &Journey, history: &[Journey]) -> Vec<Achievement> {
    if !new_journey.is_completed() {
        return Vec::new();
    }

    let past: Vec<&Journey> = history
        .iter()
        .filter(|j| j.is_completed() && j.id != new_journey.id)
        .collect();

    let mut achievements = Vec::new();

    if past.is_empty() {
        achievements.push(award(
            new_journey,
            AchievementType::FirstJourney,
            "First Journey!".to_string(),
            "Congratulations on completing your first journey!".to_string(),
            format_km(new_journey.distance),
            None,
            None,
            80,
        ));
    }

    achievements.extend(detect_distance_record(new_journey, &past));
    achievements.extend(detect_duration_record(new_journey, &past));
    achievements.extend(detect_consumption_record(new_journey, &past));
    achievements.extend(detect_milestones(new_journey, &past));
    achievements.extend(detect_streak(new_journey, &past));

    achievements.sort_by(|a, b| b.importance.cmp(&a.importance));

    achievements
}

/// Journeys from the same calendar year as `journey`.
fn same_year<'a>(journey: &Journey, past: &[&'a Journey]) -> Option<(i32, Vec<&'a Journey>)> {
    let year = parse_journey_date(&journey.date).ok()?.year();
    let year_journeys = past
        .iter()
        .copied()
        .filter(|j| matches!(parse_journey_date(&j.date), Ok(d) if d.year() == year))
        .collect();
    Some((year, year_journeys))
}

/// Longest journey of the year by distance
fn detect_distance_record(new_journey: &Journey, past: &[&Journey]) -> Option<Achievement> {
    if new_journey.distance <= LONGEST_MIN_DISTANCE_KM {
        return None;
    }
    let (year, year_journeys) = same_year(new_journey, past)?;

    let year_max = year_journeys
        .iter()
        .map(|j| j.distance)
        .fold(0.0f64, f64::max);

    if new_journey.distance <= year_max {
        return None;
    }

    Some(award(
        new_journey,
        AchievementType::LongestJourney,
        format!("Longest Journey of {}!", year),
        format!(
            "Your longest journey this year: {}",
            format_km(new_journey.distance)
        ),
        format_km(new_journey.distance),
        (year_max > 0.0).then(|| format_km(year_max)),
        (year_max > 0.0).then(|| (new_journey.distance - year_max) / year_max * 100.0),
        70,
    ))
}

/// Longest journey of the year by time
fn detect_duration_record(new_journey: &Journey, past: &[&Journey]) -> Option<Achievement> {
    let minutes = parse_duration(&new_journey.duration).ok()?;
    if minutes <= LONGEST_MIN_DURATION_MIN {
        return None;
    }
    let (year, year_journeys) = same_year(new_journey, past)?;

    let year_max = year_journeys
        .iter()
        .filter_map(|j| parse_duration(&j.duration).ok())
        .max()
        .unwrap_or(0);

    if minutes <= year_max {
        return None;
    }

    Some(award(
        new_journey,
        AchievementType::LongestDuration,
        format!("Longest Time on the Road in {}!", year),
        format!(
            "Your longest journey this year lasted {}",
            format_duration(minutes)
        ),
        format_duration(minutes),
        (year_max > 0).then(|| format_duration(year_max)),
        None,
        60,
    ))
}

/// Most efficient journey so far
fn detect_consumption_record(new_journey: &Journey, past: &[&Journey]) -> Option<Achievement> {
    let qualifies =
        |j: &Journey| j.distance >= CONSUMPTION_MIN_DISTANCE_KM && j.fuel_consumption > 0.0;
    if !qualifies(new_journey) {
        return None;
    }

    // Needs something to beat
    let best = past
        .iter()
        .copied()
        .filter(|&j| qualifies(j))
        .map(|j| j.fuel_consumption)
        .reduce(f64::min)?;

    if new_journey.fuel_consumption >= best {
        return None;
    }

    let improvement = (best - new_journey.fuel_consumption) / best * 100.0;
    Some(award(
        new_journey,
        AchievementType::BestConsumption,
        "Most Efficient Journey!".to_string(),
        format!(
            "New best fuel consumption: {}",
            format_consumption(new_journey.fuel_consumption)
        ),
        format_consumption(new_journey.fuel_consumption),
        Some(format_consumption(best)),
        Some(improvement),
        calculate_consumption_importance(improvement),
    ))
}

/// Journey count and total distance milestones
fn detect_milestones(new_journey: &Journey, past: &[&Journey]) -> Vec<Achievement> {
    let mut achievements = Vec::new();

    let count = past.len() + 1;
    if COUNT_MILESTONES.contains(&count) {
        achievements.push(award(
            new_journey,
            AchievementType::Milestone,
            format!("{} Journeys!", count),
            format!("You've completed {} journeys. Keep it up!", count),
            count.to_string(),
            None,
            None,
            calculate_count_importance(count),
        ));
    }

    let previous_km: f64 = past.iter().map(|j| j.distance).sum();
    let total_km = previous_km + new_journey.distance;
    for &milestone in &DISTANCE_MILESTONES_KM {
        if previous_km < milestone && total_km >= milestone {
            achievements.push(award(
                new_journey,
                AchievementType::Milestone,
                format!("{}km Total!", milestone as i64),
                format!("You've driven {} kilometers in total!", milestone as i64),
                format!("{}km", milestone as i64),
                None,
                None,
                calculate_distance_importance(milestone),
            ));
        }
    }

    achievements
}

/// Consecutive days ending on the new journey's day
fn detect_streak(new_journey: &Journey, past: &[&Journey]) -> Option<Achievement> {
    let today = parse_journey_date(&new_journey.date).ok()?.date();

    let days: BTreeSet<NaiveDate> = past
        .iter()
        .filter_map(|j| parse_journey_date(&j.date).ok())
        .map(|d| d.date())
        .collect();

    // Only the first journey of a day can extend the streak
    if days.contains(&today) {
        return None;
    }

    let mut streak = 1u32;
    let mut day = today - Duration::days(1);
    while days.contains(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }

    if !STREAK_MILESTONES.contains(&streak) {
        return None;
    }

    Some(award(
        new_journey,
        AchievementType::Streak,
        format!("{}-Day Streak!", streak),
        format!("You've completed journeys {} days in a row!", streak),
        format!("{} days", streak),
        None,
        None,
        calculate_streak_importance(streak),
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn award(
    journey: &Journey,
    achievement_type: AchievementType,
    title: String,
    description: String,
    value: String,
    previous_best: Option<String>,
    improvement_percent: Option<f64>,
    importance: u8,
) -> Achievement {
    Achievement {
        achievement_type,
        title,
        description,
        value,
        previous_best,
        improvement_percent,
        journey_id: journey.id.clone(),
        date: journey.date.clone(),
        importance,
    }
}

fn format_km(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0) as i64)
    } else {
        format!("{:.1}km", km)
    }
}

fn format_consumption(liters_per_100km: f64) -> String {
    format!("{:.1} L/100km", liters_per_100km)
}

fn calculate_consumption_importance(improvement: f64) -> u8 {
    match improvement {
        pct if pct > 15.0 => 75,
        pct if pct > 5.0 => 65,
        _ => 55,
    }
}

fn calculate_count_importance(count: usize) -> u8 {
    match count {
        10 => 40,
        25 => 50,
        50 => 60,
        100 => 75,
        250 => 80,
        500 => 85,
        1000 => 95,
        _ => 50,
    }
}

fn calculate_distance_importance(km: f64) -> u8 {
    match km as i64 {
        100 => 50,
        500 => 60,
        1000 => 75,
        2500 => 80,
        5000 => 90,
        10000 => 95,
        50000 => 100,
        _ => 50,
    }
}

fn calculate_streak_importance(days: u32) -> u8 {
    match days {
        3 => 45,
        7 => 65,
        14 => 80,
        30 => 95,
        _ => 50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey::tests::make_journey;
    use crate::journey::JourneyStatus;

    fn journey_on(id: &str, date: &str, distance: f64) -> Journey {
        let mut j = make_journey(id, distance, JourneyStatus::Completed);
        j.date = date.to_string();
        j
    }

    fn has(achievements: &[Achievement], kind: AchievementType) -> bool {
        achievements.iter().any(|a| a.achievement_type == kind)
    }

    #[test]
    fn test_first_journey() {
        let new = journey_on("j1", "10/03/2024 08:00", 5.0);
        let achievements = detect_achievements(&new, &[new.clone()]);
        assert!(has(&achievements, AchievementType::FirstJourney));
    }

    #[test]
    fn test_incomplete_journey_earns_nothing() {
        let mut new = journey_on("j1", "10/03/2024 08:00", 500.0);
        new.status = JourneyStatus::InProgress;
        assert!(detect_achievements(&new, &[]).is_empty());
    }

    #[test]
    fn test_distance_record_within_year() {
        let old = journey_on("old", "02/01/2024 08:00", 80.0);
        let last_year = journey_on("ly", "02/01/2023 08:00", 300.0);
        let new = journey_on("new", "10/03/2024 08:00", 120.0);

        let achievements = detect_achievements(&new, &[old, last_year]);
        let record = achievements
            .iter()
            .find(|a| a.achievement_type == AchievementType::LongestJourney)
            .expect("distance record");
        assert!(record.title.contains("2024"));
        assert_eq!(record.previous_best.as_deref(), Some("80.0km"));
        assert!((record.improvement_percent.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_record() {
        let old = journey_on("old", "02/01/2024 08:00", 5.0);
        let mut new = journey_on("new", "10/03/2024 08:00", 5.0);
        new.duration = "3h 15min".to_string();

        let achievements = detect_achievements(&new, &[old]);
        let record = achievements
            .iter()
            .find(|a| a.achievement_type == AchievementType::LongestDuration)
            .expect("duration record");
        assert_eq!(record.value, "3h 15min");
        assert_eq!(record.previous_best.as_deref(), Some("1h 0min"));
    }

    #[test]
    fn test_consumption_record_needs_history() {
        let mut new = journey_on("new", "10/03/2024 08:00", 50.0);
        new.fuel_consumption = 6.0;
        assert!(!has(&detect_achievements(&new, &[]), AchievementType::BestConsumption));

        let old = journey_on("old", "02/03/2024 08:00", 50.0);
        let achievements = detect_achievements(&new, &[old]);
        let record = achievements
            .iter()
            .find(|a| a.achievement_type == AchievementType::BestConsumption)
            .expect("consumption record");
        assert_eq!(record.value, "6.0 L/100km");
        assert_eq!(record.importance, 75);
    }

    #[test]
    fn test_count_and_distance_milestones() {
        let history: Vec<Journey> = (0..9)
            .map(|i| journey_on(&format!("j{}", i), "01/01/2023 08:00", 10.0))
            .collect();
        let new = journey_on("j9", "05/01/2023 08:00", 15.0);

        let achievements = detect_achievements(&new, &history);
        assert!(achievements
            .iter()
            .any(|a| a.achievement_type == AchievementType::Milestone
                && a.title == "10 Journeys!"));
        assert!(achievements
            .iter()
            .any(|a| a.achievement_type == AchievementType::Milestone
                && a.title == "100km Total!"));
    }

    #[test]
    fn test_three_day_streak() {
        let history = vec![
            journey_on("a", "08/03/2024 08:00", 5.0),
            journey_on("b", "09/03/2024 18:00", 5.0),
        ];
        let new = journey_on("c", "10/03/2024 07:00", 5.0);
        let achievements = detect_achievements(&new, &history);
        assert!(achievements
            .iter()
            .any(|a| a.achievement_type == AchievementType::Streak && a.title == "3-Day Streak!"));

        // A second journey on the same day doesn't re-award
        let mut again = new.clone();
        again.id = "d".to_string();
        let mut with_today = history.clone();
        with_today.push(new);
        assert!(!has(&detect_achievements(&again, &with_today), AchievementType::Streak));
    }

    #[test]
    fn test_sorted_by_importance() {
        let new = journey_on("j1", "10/03/2024 08:00", 150.0);
        let achievements = detect_achievements(&new, &[]);
        assert!(achievements.len() >= 2);
        assert!(achievements
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }
}
