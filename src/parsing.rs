//! Parsers for the locale-formatted journey fields.
//!
//! Journeys carry their date as `DD/MM/YYYY HH:mm` and their duration as
//! `Xh Ymin`. Both parsers return a tagged result; callers decide what a
//! malformed value means for them (the filter drops it, the sort puts it
//! last, the metrics count it as zero).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;

// ASCII digits only; `\d` would also match other Unicode digit classes
static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)h").expect("valid hours pattern"));
static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)min").expect("valid minutes pattern"));

/// Parse a `DD/MM/YYYY HH:mm` journey date into a local wall-clock time.
///
/// Fields are range checked: `31/02/2024 10:00` or `01/13/2024 10:00` are
/// errors rather than rolling over into the next month or year.
///
/// # Example
/// ```
/// use giropro_journeys::parsing::parse_journey_date;
///
/// let date = parse_journey_date("15/03/2024 08:30").unwrap();
/// assert_eq!(date.to_string(), "2024-03-15 08:30:00");
/// assert!(parse_journey_date("2024-03-15").is_err());
/// ```
pub fn parse_journey_date(s: &str) -> Result<NaiveDateTime, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidDate {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = s.split_whitespace();
    let (date_part, time_part) = match (parts.next(), parts.next(), parts.next()) {
        (Some(d), Some(t), None) => (d, t),
        _ => return Err(invalid("expected 'DD/MM/YYYY HH:mm'")),
    };

    let date_fields: Vec<&str> = date_part.split('/').collect();
    let time_fields: Vec<&str> = time_part.split(':').collect();
    if date_fields.len() != 3 || time_fields.len() != 2 {
        return Err(invalid("expected 'DD/MM/YYYY HH:mm'"));
    }

    let number = |field: &str| -> Result<u32, ParseError> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("non-numeric field"));
        }
        field.parse::<u32>().map_err(|_| invalid("non-numeric field"))
    };

    let day = number(date_fields[0])?;
    let month = number(date_fields[1])?;
    let year = number(date_fields[2])?;
    let hour = number(time_fields[0])?;
    let minute = number(time_fields[1])?;

    let year = i32::try_from(year).map_err(|_| invalid("year out of range"))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid("day or month out of range"))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| invalid("hour or minute out of range"))?;

    Ok(NaiveDateTime::new(date, time))
}

/// Parse an `Xh Ymin` duration into total minutes.
///
/// The hours and minutes groups are searched independently, so `2h`,
/// `45min` and `1h 30min` are all accepted. A string with neither group is
/// an error.
///
/// # Example
/// ```
/// use giropro_journeys::parsing::parse_duration;
///
/// assert_eq!(parse_duration("1h 30min").unwrap(), 90);
/// assert_eq!(parse_duration("45min").unwrap(), 45);
/// assert!(parse_duration("a while").is_err());
/// ```
pub fn parse_duration(s: &str) -> Result<u32, ParseError> {
    let invalid = || ParseError::InvalidDuration {
        input: s.to_string(),
    };

    let capture = |re: &Regex| -> Result<Option<u32>, ParseError> {
        match re.captures(s) {
            Some(caps) => caps[1].parse::<u32>().map(Some).map_err(|_| invalid()),
            None => Ok(None),
        }
    };

    let hours = capture(&HOURS_RE)?;
    let minutes = capture(&MINUTES_RE)?;
    if hours.is_none() && minutes.is_none() {
        return Err(invalid());
    }

    hours
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes.unwrap_or(0)))
        .ok_or_else(invalid)
}

/// Format a date the way journeys store it.
pub fn format_journey_date(date: &NaiveDateTime) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// Format minutes the way journeys store durations.
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}min", minutes / 60, minutes % 60)
}
