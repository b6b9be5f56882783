//! Parking session data model.
//!
//! A session is open from `start_session` until `end_session`; the end
//! transition stamps `end_time`, prices the stay and clears `is_active`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// One parked-vehicle billing period for a license plate on a street.
///
/// Timestamps are instants truncated to the minute, carrying the UTC offset
/// the configured zone had at that moment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSession {
    /// Assigned by the store on first save.
    pub id: Option<String>,
    pub license_plate: String,
    pub street_name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: Option<DateTime<FixedOffset>>,
    /// Major currency units, zero while the session is open.
    pub cost: f64,
    pub is_active: bool,
}

impl ParkingSession {
    pub fn open(license_plate: &str, street_name: &str, start_time: DateTime<FixedOffset>) -> Self {
        Self {
            id: None,
            license_plate: license_plate.to_string(),
            street_name: street_name.to_string(),
            start_time,
            end_time: None,
            cost: 0.0,
            is_active: true,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_active && self.end_time.is_none() {
            SessionStatus::Open
        } else {
            SessionStatus::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == SessionStatus::Open
    }

    /// Final transition; the record is not modified afterwards.
    pub fn close(&mut self, end_time: DateTime<FixedOffset>, cost: f64) {
        self.end_time = Some(end_time);
        self.cost = cost;
        self.is_active = false;
    }
}
