//! Free-parking calendar: the nightly free window, Sundays and holidays.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use log::info;

use crate::error::{ParkingError, Result};

/// Accepted clock formats for the window boundaries, `20:59` or `20:59:00`.
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Nightly free-parking window.
///
/// A minute is free when its clock time is strictly after `start` or strictly
/// before `end`, so `20:59`..`08:00` frees 21:00 through 07:59 while 20:59 and
/// 08:00 themselves are still charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl FreeWindow {
    pub fn new(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32) -> Result<Self> {
        let start = NaiveTime::from_hms_opt(start_hour, start_minute, 0);
        let end = NaiveTime::from_hms_opt(end_hour, end_minute, 0);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(ParkingError::InvalidFreeWindowConfig {
                start: format!("{start_hour}:{start_minute}"),
                end: format!("{end_hour}:{end_minute}"),
            }),
        }
    }

    /// Parses the configured boundary strings. Seconds are dropped.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let invalid = || ParkingError::InvalidFreeWindowConfig {
            start: start.to_string(),
            end: end.to_string(),
        };

        let start_time = parse_clock(start).ok_or_else(invalid)?;
        let end_time = parse_clock(end).ok_or_else(invalid)?;
        let window = Self::new(
            start_time.hour(),
            start_time.minute(),
            end_time.hour(),
            end_time.minute(),
        )?;

        info!(
            "Free parking window is {}:{:02} to {}:{:02}",
            window.start.hour(),
            window.start.minute(),
            window.end.hour(),
            window.end.minute()
        );
        Ok(window)
    }

    /// `(start_hour, start_minute, end_hour, end_minute)`
    pub fn daily_free_window(&self) -> (u32, u32, u32, u32) {
        (
            self.start.hour(),
            self.start.minute(),
            self.end.hour(),
            self.end.minute(),
        )
    }

    pub fn covers(&self, time: NaiveTime) -> bool {
        time > self.start || time < self.end
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

/// Dates on which parking is free all day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Parses ISO dates (`2025-03-03`). Blank entries are skipped.
    pub fn parse<S: AsRef<str>>(raw_dates: &[S]) -> Result<Self> {
        let mut dates = BTreeSet::new();
        for raw in raw_dates {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ParkingError::InvalidHoliday(raw.to_string()))?;
            dates.insert(date);
        }
        Ok(Self { dates })
    }

    pub fn holiday_set(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// True when parking at `instant` costs nothing.
pub fn is_free_minute(instant: NaiveDateTime, window: &FreeWindow, holidays: &HolidayCalendar) -> bool {
    window.covers(instant.time())
        || instant.weekday() == Weekday::Sun
        || holidays.contains(instant.date())
}
