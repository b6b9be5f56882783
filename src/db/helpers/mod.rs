use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Observation times are wall-clock readings without an offset.
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Session times keep their UTC offset so readings from the repeated hour
/// after clocks go back stay distinct. Order these with `julianday()`, not
/// lexically.
const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub fn format_local(value: &NaiveDateTime) -> String {
    value.format(LOCAL_DATETIME_FORMAT).to_string()
}

pub fn parse_local(value: &str, field: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_DATETIME_FORMAT)
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn format_instant(value: &DateTime<FixedOffset>) -> String {
    value.format(INSTANT_FORMAT).to_string()
}

pub fn parse_instant(value: &str, field: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, INSTANT_FORMAT)
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn parse_optional_instant(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<FixedOffset>>> {
    match value {
        Some(raw) => parse_instant(&raw, field).map(Some),
        None => Ok(None),
    }
}
