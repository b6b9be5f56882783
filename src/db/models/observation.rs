//! License plate observation data model.
//!
//! Observations come from street scans and are compared against active
//! sessions to find vehicles parked without one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LicensePlateObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub license_plate: String,
    pub street_name: String,
    pub observation_time: NaiveDateTime,
}
