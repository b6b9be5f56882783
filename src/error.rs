//! Error types for parking sessions and billing.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use thiserror::Error;

/// Errors surfaced by the billing engine and the session manager.
///
/// Configuration variants are raised once while building the
/// [`BillingConfig`](crate::billing::BillingConfig); request variants are
/// returned before any record is written.
#[derive(Error, Debug)]
pub enum ParkingError {
    #[error("No street found for street name: {0}")]
    UnknownStreet(String),

    #[error("No active session found for license plate: {0}")]
    NoActiveSession(String),

    #[error("License plate {0} already has an active parking session")]
    SessionAlreadyActive(String),

    #[error("Invalid free parking start/end time configured: start time: {start}, end time: {end}")]
    InvalidFreeWindowConfig { start: String, end: String },

    #[error("Invalid holiday date configured: {0}")]
    InvalidHoliday(String),

    #[error("Unknown time zone configured: {0}")]
    InvalidTimeZone(String),

    #[error("Local time {0} does not exist in the configured time zone")]
    NonexistentLocalTime(NaiveDateTime),

    #[error("End time {end} precedes start time {start}")]
    InvalidInterval {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    /// Persistence failure reported by a session store.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ParkingError>;
