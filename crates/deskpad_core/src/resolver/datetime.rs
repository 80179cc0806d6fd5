//! Best-effort date/time extraction for calendar event synthesis.
//!
//! # Responsibility
//! - Find a US-style `month/day/year` date and an optional `h:mm[am|pm]`
//!   time in free text.
//! - Build a fixed-length event window from them.
//!
//! # Invariants
//! - Malformed or ambiguous input fails extraction; it never panics.
//! - A date without a time starts at the configured default time.
//! - The window end is always `start + duration`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").expect("valid date regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)?\b").expect("valid time regex")
});

/// Why no event window could be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Text contains no date pattern.
    NoDate,
    /// Date pattern matched but is not a calendar date.
    InvalidDate { month: u32, day: u32, year: i32 },
    /// Time pattern matched but is not a wall-clock time.
    InvalidTime { hour: u32, minute: u32 },
    /// Window end falls outside the representable date range.
    OutOfRange,
}

impl Display for ExtractionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDate => write!(f, "no date found"),
            Self::InvalidDate { month, day, year } => {
                write!(f, "invalid date {month}/{day}/{year}")
            }
            Self::InvalidTime { hour, minute } => write!(f, "invalid time {hour}:{minute:02}"),
            Self::OutOfRange => write!(f, "event window out of range"),
        }
    }
}

impl Error for ExtractionFailure {}

/// Tunables for event window synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTiming {
    /// Start time used when the text carries a date only.
    pub default_time: NaiveTime,
    /// Event length.
    pub duration: Duration,
    /// Added to two-digit years.
    pub two_digit_year_base: i32,
}

impl Default for EventTiming {
    fn default() -> Self {
        Self {
            default_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            duration: Duration::hours(1),
            two_digit_year_base: 2000,
        }
    }
}

/// Start/end pair of a synthesized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Extracts an event window from free text.
pub fn extract_event_window(
    text: &str,
    timing: &EventTiming,
) -> Result<EventWindow, ExtractionFailure> {
    let date = extract_date(text, timing.two_digit_year_base)?;
    let time = extract_time(text)?.unwrap_or(timing.default_time);
    let start = date.and_time(time);
    let end = start
        .checked_add_signed(timing.duration)
        .ok_or(ExtractionFailure::OutOfRange)?;
    Ok(EventWindow { start, end })
}

fn extract_date(text: &str, two_digit_year_base: i32) -> Result<NaiveDate, ExtractionFailure> {
    let caps = DATE_RE.captures(text).ok_or(ExtractionFailure::NoDate)?;
    let month = capture_number(&caps, 1).ok_or(ExtractionFailure::NoDate)?;
    let day = capture_number(&caps, 2).ok_or(ExtractionFailure::NoDate)?;
    let raw_year = capture_number(&caps, 3).ok_or(ExtractionFailure::NoDate)?;
    let year = if caps[3].len() == 2 {
        two_digit_year_base.checked_add(raw_year as i32)
    } else {
        Some(raw_year as i32)
    }
    .ok_or(ExtractionFailure::OutOfRange)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(ExtractionFailure::InvalidDate { month, day, year })
}

fn extract_time(text: &str) -> Result<Option<NaiveTime>, ExtractionFailure> {
    let Some(caps) = TIME_RE.captures(text) else {
        return Ok(None);
    };
    let (Some(raw_hour), Some(minute)) = (capture_number(&caps, 1), capture_number(&caps, 2))
    else {
        return Ok(None);
    };
    let meridiem = caps.get(3).map(|m| m.as_str().to_ascii_lowercase());
    let hour = match meridiem.as_deref() {
        Some("pm") if raw_hour != 12 => raw_hour + 12,
        Some("am") if raw_hour == 12 => 0,
        _ => raw_hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(Some)
        .ok_or(ExtractionFailure::InvalidTime { hour, minute })
}

fn capture_number(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{extract_event_window, EventTiming, ExtractionFailure};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn meeting_with_pm_time() {
        let window =
            extract_event_window("Meeting 12/25/25 3:30pm", &EventTiming::default()).unwrap();
        assert_eq!(window.start, at(2025, 12, 25, 15, 30));
        assert_eq!(window.end, at(2025, 12, 25, 16, 30));
    }

    #[test]
    fn date_only_defaults_to_nine() {
        let window = extract_event_window("Birthday 3-7-2026", &EventTiming::default()).unwrap();
        assert_eq!(window.start, at(2026, 3, 7, 9, 0));
        assert_eq!(window.end, at(2026, 3, 7, 10, 0));
    }

    #[test]
    fn noon_and_midnight_meridiem() {
        let timing = EventTiming::default();
        let noon = extract_event_window("1/2/26 12:15 PM", &timing).unwrap();
        assert_eq!(noon.start, at(2026, 1, 2, 12, 15));
        let midnight = extract_event_window("1/2/26 12:05am", &timing).unwrap();
        assert_eq!(midnight.start, at(2026, 1, 2, 0, 5));
    }

    #[test]
    fn twenty_four_hour_time_without_meridiem() {
        let window = extract_event_window("Flight 7/4/2026 18:45", &EventTiming::default()).unwrap();
        assert_eq!(window.start, at(2026, 7, 4, 18, 45));
    }

    #[test]
    fn missing_date_fails() {
        assert_eq!(
            extract_event_window("Lunch at 1:00pm", &EventTiming::default()),
            Err(ExtractionFailure::NoDate)
        );
    }

    #[test]
    fn impossible_values_fail_silently() {
        let timing = EventTiming::default();
        assert!(matches!(
            extract_event_window("13/45/25", &timing),
            Err(ExtractionFailure::InvalidDate { month: 13, .. })
        ));
        assert!(matches!(
            extract_event_window("1/2/26 25:00", &timing),
            Err(ExtractionFailure::InvalidTime { hour: 25, .. })
        ));
    }

    #[test]
    fn custom_timing_is_applied() {
        let timing = EventTiming {
            default_time: chrono::NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            duration: chrono::Duration::minutes(30),
            two_digit_year_base: 1900,
        };
        let window = extract_event_window("Party 5/6/99", &timing).unwrap();
        assert_eq!(window.start, at(1999, 5, 6, 8, 30));
        assert_eq!(window.end, at(1999, 5, 6, 9, 0));
    }

    #[test]
    fn overflowing_window_fails_instead_of_panicking() {
        let long = EventTiming {
            duration: chrono::Duration::try_weeks(1_000_000_000).unwrap(),
            ..EventTiming::default()
        };
        assert_eq!(
            extract_event_window("Trip 1/1/2026", &long),
            Err(ExtractionFailure::OutOfRange)
        );

        let far_base = EventTiming {
            two_digit_year_base: i32::MAX,
            ..EventTiming::default()
        };
        assert_eq!(
            extract_event_window("Trip 1/1/26", &far_base),
            Err(ExtractionFailure::OutOfRange)
        );
    }
}
