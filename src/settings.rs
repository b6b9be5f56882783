use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::billing::{
    config::parse_time_zone, BillingConfig, FreeWindow, HolidayCalendar, PricingTable,
};

pub const CONFIG_ENV_VAR: &str = "STREETPARK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "streetpark.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FreeParkingSettings {
    pub start_time: String,
    pub end_time: String,
}

impl Default for FreeParkingSettings {
    fn default() -> Self {
        Self {
            start_time: "20:59".into(),
            end_time: "08:00".into(),
        }
    }
}

/// Raw contents of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub timezone: String,
    pub free_parking: FreeParkingSettings,
    pub holidays: Vec<String>,
    /// Street name to minor currency units per minute.
    pub streets: BTreeMap<String, u32>,
    pub database_path: PathBuf,
    pub report_path: PathBuf,
    pub report_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "Europe/Amsterdam".into(),
            free_parking: FreeParkingSettings::default(),
            holidays: Vec::new(),
            streets: BTreeMap::from([("Java".to_string(), 15), ("Kotlin".to_string(), 12)]),
            database_path: PathBuf::from("streetpark.sqlite3"),
            report_path: PathBuf::from("unregistered_plates_report.txt"),
            report_interval_secs: 3600,
        }
    }
}

impl Settings {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "No settings file at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Explicit path, then `STREETPARK_CONFIG`, then `streetpark.json`.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Validates everything billing needs. Any malformed value is fatal here
    /// so that requests never see a configuration error.
    pub fn billing_config(&self) -> Result<BillingConfig> {
        let time_zone = parse_time_zone(&self.timezone)?;
        let free_window =
            FreeWindow::parse(&self.free_parking.start_time, &self.free_parking.end_time)?;
        let holidays = HolidayCalendar::parse(&self.holidays)?;
        let pricing: PricingTable = self
            .streets
            .iter()
            .map(|(street, price)| (street.clone(), *price))
            .collect();
        if pricing.is_empty() {
            log::warn!("No streets are priced; every session start will be rejected");
        }

        log::info!(
            "Loaded pricing for {} streets, {} holidays, zone {}",
            pricing.len(),
            holidays.holiday_set().len(),
            time_zone
        );
        Ok(BillingConfig::new(pricing, free_window, holidays, time_zone))
    }
}
