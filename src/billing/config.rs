use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use super::{FreeWindow, HolidayCalendar, PricingTable};
use crate::error::{ParkingError, Result};

/// Immutable billing inputs, built once at startup and shared by `Arc`.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub pricing: PricingTable,
    pub free_window: FreeWindow,
    pub holidays: HolidayCalendar,
    /// Zone whose wall clock decides free minutes.
    pub time_zone: Tz,
}

impl BillingConfig {
    pub fn new(
        pricing: PricingTable,
        free_window: FreeWindow,
        holidays: HolidayCalendar,
        time_zone: Tz,
    ) -> Self {
        Self {
            pricing,
            free_window,
            holidays,
            time_zone,
        }
    }

    /// Price per minute for a street, or `UnknownStreet`.
    pub fn price_for(&self, street_name: &str) -> Result<u32> {
        self.pricing
            .lookup(street_name)
            .ok_or_else(|| ParkingError::UnknownStreet(street_name.to_string()))
    }

    /// Places a wall-clock reading in the configured zone. A reading that
    /// occurs twice when clocks go back resolves to the earlier instant.
    pub fn localize(&self, local: NaiveDateTime) -> Result<DateTime<Tz>> {
        self.time_zone
            .from_local_datetime(&local)
            .earliest()
            .ok_or(ParkingError::NonexistentLocalTime(local))
    }
}

/// Resolves an IANA zone name such as `Europe/Amsterdam`.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ParkingError::InvalidTimeZone(name.to_string()))
}
