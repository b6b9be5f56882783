use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use chrono_tz::Tz;
use log::info;
use serde::{Deserialize, Serialize};

use super::calendar::is_free_minute;
use super::{BillingConfig, FreeWindow, HolidayCalendar};
use crate::error::{ParkingError, Result};

/// Outcome of pricing one interval on one street.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub chargeable_minutes: u64,
    /// Minor currency units per minute.
    pub price_per_minute: u32,
    /// Major currency units.
    pub cost: f64,
}

impl Charge {
    pub fn new(chargeable_minutes: u64, price_per_minute: u32) -> Self {
        // Single division at the end; per-minute division accumulates error.
        let cost = chargeable_minutes as f64 * f64::from(price_per_minute) / 100.0;
        Self {
            chargeable_minutes,
            price_per_minute,
            cost,
        }
    }
}

/// Counts the chargeable minutes in `[start, end)`.
///
/// The interval is walked one elapsed minute at a time from `start`. Each
/// minute is judged by its wall-clock reading in `start`'s zone: it counts
/// unless it falls inside the free window, on a Sunday or on a holiday.
/// Direction is checked on the absolute instants, so a session ending in the
/// repeated hour after clocks go back is still a forward interval.
pub fn chargeable_minutes(
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    free_window: &FreeWindow,
    holidays: &HolidayCalendar,
) -> Result<u64> {
    if end < start {
        return Err(ParkingError::InvalidInterval {
            start: start.fixed_offset(),
            end: end.fixed_offset(),
        });
    }

    let step = TimeDelta::minutes(1);
    let mut cursor = start;
    let mut minutes = 0u64;
    while cursor < end {
        if !is_free_minute(cursor.naive_local(), free_window, holidays) {
            minutes += 1;
        }
        cursor += step;
    }

    Ok(minutes)
}

/// Prices `[start, end)` for `street_name` using the configured tariffs.
pub fn price_interval(
    config: &BillingConfig,
    street_name: &str,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
) -> Result<Charge> {
    let price_per_minute = config.price_for(street_name)?;
    let minutes = chargeable_minutes(
        start.with_timezone(&config.time_zone),
        end.with_timezone(&config.time_zone),
        &config.free_window,
        &config.holidays,
    )?;
    let charge = Charge::new(minutes, price_per_minute);

    info!(
        "Street {street_name}: {} chargeable minutes at {} per minute, cost {}",
        charge.chargeable_minutes, charge.price_per_minute, charge.cost
    );
    Ok(charge)
}

/// Drops seconds and sub-second precision; billing works on whole minutes.
pub fn truncate_to_minute<Z: TimeZone>(instant: DateTime<Z>) -> DateTime<Z> {
    let into_minute = TimeDelta::seconds(i64::from(instant.second()))
        + TimeDelta::nanoseconds(i64::from(instant.nanosecond()));
    instant - into_minute
}
