use anyhow::Result;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_local, parse_local},
    models::LicensePlateObservation,
};

fn row_to_observation(row: &Row) -> Result<LicensePlateObservation> {
    let observation_time: String = row.get("observation_time")?;

    Ok(LicensePlateObservation {
        id: Some(row.get("id")?),
        license_plate: row.get("license_plate")?,
        street_name: row.get("street_name")?,
        observation_time: parse_local(&observation_time, "observation_time")?,
    })
}

impl Database {
    /// Replaces the whole observation log with the latest scan.
    pub async fn replace_observations(
        &self,
        observations: &[LicensePlateObservation],
    ) -> Result<usize> {
        let records = observations.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute("DELETE FROM license_plate_observations", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO license_plate_observations (id, license_plate, street_name, observation_time)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for record in &records {
                    let id = record
                        .id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                    stmt.execute(params![
                        id,
                        record.license_plate,
                        record.street_name,
                        format_local(&record.observation_time),
                    ])?;
                }
            }

            tx.commit()?;
            Ok(records.len())
        })
        .await
    }

    /// Observation log in scan order.
    pub async fn list_observations(&self) -> Result<Vec<LicensePlateObservation>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, license_plate, street_name, observation_time
                 FROM license_plate_observations
                 ORDER BY observation_time ASC, license_plate ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut observations = Vec::new();
            while let Some(row) = rows.next()? {
                observations.push(row_to_observation(row)?);
            }

            Ok(observations)
        })
        .await
    }
}
