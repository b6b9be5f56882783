use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use log::{error, info};

use crate::{
    db::{models::LicensePlateObservation, Database},
    store::SessionStore,
};

const REPORT_TITLE: &str = "Unregistered Plates Report";

/// Observations whose plate has no active session in `store`.
pub async fn identify_unregistered_plates(
    observations: &[LicensePlateObservation],
    store: &dyn SessionStore,
) -> Result<Vec<LicensePlateObservation>> {
    let mut unregistered = Vec::new();
    for observation in observations {
        let active = store
            .find_by_plate_and_active(&observation.license_plate, true)
            .await
            .with_context(|| {
                format!("failed to look up sessions for {}", observation.license_plate)
            })?;
        if active.is_none() {
            unregistered.push(observation.clone());
        }
    }
    Ok(unregistered)
}

/// ISO local time; seconds are shown only when they are not zero.
fn format_observed(time: &NaiveDateTime) -> String {
    if time.second() == 0 && time.nanosecond() == 0 {
        time.format("%Y-%m-%dT%H:%M").to_string()
    } else {
        time.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// Writes the report, replacing any previous file at `path`.
pub fn write_report(path: &Path, unregistered: &[LicensePlateObservation]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{REPORT_TITLE}")?;
    writeln!(writer, "{}", "=".repeat(REPORT_TITLE.len()))?;
    for observation in unregistered {
        writeln!(
            writer,
            "License Plate: {}, Street: {}, Date: {}",
            observation.license_plate,
            observation.street_name,
            format_observed(&observation.observation_time)
        )?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write report file {}", path.display()))
}

/// One full pass: load observations, check them against active sessions and
/// write the report. Returns the unregistered observations.
pub async fn run_report(db: &Database, report_path: &Path) -> Result<Vec<LicensePlateObservation>> {
    info!("Checking observed plates for unregistered vehicles");
    let observations = db.list_observations().await?;
    let unregistered = identify_unregistered_plates(&observations, db).await?;
    info!(
        "{} of {} observed plates are unregistered",
        unregistered.len(),
        observations.len()
    );

    if let Err(err) = write_report(report_path, &unregistered) {
        error!("Failed to write report file: {err:#}");
        return Err(err);
    }
    info!("Report generated: {}", report_path.display());
    Ok(unregistered)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
    use chrono_tz::Tz;

    use super::*;
    use crate::{db::models::ParkingSession, store::InMemorySessionStore};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 4)
            .unwrap()
            .and_hms_opt(h, 15, 0)
            .unwrap()
    }

    fn started(h: u32) -> DateTime<FixedOffset> {
        Tz::Europe__Amsterdam
            .from_local_datetime(&at(h))
            .unwrap()
            .fixed_offset()
    }

    fn observation(plate: &str, street: &str) -> LicensePlateObservation {
        LicensePlateObservation {
            id: None,
            license_plate: plate.to_string(),
            street_name: street.to_string(),
            observation_time: at(11),
        }
    }

    #[tokio::test]
    async fn plates_without_active_session_are_unregistered() {
        let store = InMemorySessionStore::new();
        store
            .save(&ParkingSession::open("PAID01", "Java", started(9)))
            .await
            .unwrap();
        let mut finished = ParkingSession::open("GONE01", "Java", started(8));
        finished.close(started(9), 3.0);
        store.save(&finished).await.unwrap();

        let observations = vec![
            observation("PAID01", "Java"),
            observation("GONE01", "Java"),
            observation("NEVER1", "Kotlin"),
        ];
        let unregistered = identify_unregistered_plates(&observations, &store)
            .await
            .unwrap();

        let plates: Vec<&str> = unregistered
            .iter()
            .map(|o| o.license_plate.as_str())
            .collect();
        assert_eq!(plates, vec!["GONE01", "NEVER1"]);
    }

    #[test]
    fn report_lists_each_observation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unregistered_plates_report.txt");

        write_report(&path, &[observation("NEVER1", "Kotlin")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Unregistered Plates Report\n\
             ==========================\n\
             License Plate: NEVER1, Street: Kotlin, Date: 2025-03-04T11:15\n"
        );
    }

    #[test]
    fn report_keeps_non_zero_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unregistered_plates_report.txt");
        let mut late = observation("NEVER1", "Kotlin");
        late.observation_time = at(11).with_second(42).unwrap();

        write_report(&path, &[late]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("Date: 2025-03-04T11:15:42\n"));
    }

    #[tokio::test]
    async fn full_pass_reads_observations_from_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("parking.sqlite3")).unwrap();
        db.save(&ParkingSession::open("PAID01", "Java", started(9)))
            .await
            .unwrap();
        db.replace_observations(&[observation("PAID01", "Java"), observation("NEVER1", "Java")])
            .await
            .unwrap();

        let path = dir.path().join("report.txt");
        let unregistered = run_report(&db, &path).await.unwrap();

        assert_eq!(unregistered.len(), 1);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("License Plate: NEVER1"));
    }
}
