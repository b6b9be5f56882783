use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{format_instant, parse_instant, parse_optional_instant},
    models::ParkingSession,
};
use crate::store::{new_session_id, SessionStore};

const SESSION_COLUMNS: &str =
    "id, license_plate, street_name, start_time, end_time, cost, is_active";

fn row_to_session(row: &Row) -> Result<ParkingSession> {
    let start_time: String = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;

    Ok(ParkingSession {
        id: Some(row.get("id")?),
        license_plate: row.get("license_plate")?,
        street_name: row.get("street_name")?,
        start_time: parse_instant(&start_time, "start_time")?,
        end_time: parse_optional_instant(end_time, "end_time")?,
        cost: row.get("cost")?,
        is_active: row.get("is_active")?,
    })
}

fn query_sessions(
    conn: &Connection,
    filter_and_order: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<ParkingSession>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM parking_sessions {filter_and_order}");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params)?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(row_to_session(row)?);
    }
    Ok(sessions)
}

impl Database {
    pub async fn get_session(&self, session_id: &str) -> Result<Option<ParkingSession>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let sessions = query_sessions(conn, "WHERE id = ?1", params![session_id])?;
            Ok(sessions.into_iter().next())
        })
        .await
    }

    pub async fn count_sessions(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM parking_sessions", [], |row| row.get(0))?;
            u64::try_from(count).map_err(|_| anyhow!("negative session count {count}"))
        })
        .await
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn save(&self, session: &ParkingSession) -> Result<ParkingSession> {
        let mut record = session.clone();
        let id = record.id.get_or_insert_with(new_session_id).clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO parking_sessions (id, license_plate, street_name, start_time, end_time, cost, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     license_plate = excluded.license_plate,
                     street_name = excluded.street_name,
                     start_time = excluded.start_time,
                     end_time = excluded.end_time,
                     cost = excluded.cost,
                     is_active = excluded.is_active",
                params![
                    id,
                    record.license_plate,
                    record.street_name,
                    format_instant(&record.start_time),
                    record.end_time.as_ref().map(format_instant),
                    record.cost,
                    record.is_active,
                ],
            )?;

            let sessions = query_sessions(conn, "WHERE id = ?1", params![id])?;
            sessions
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("session {id} not found after save"))
        })
        .await
    }

    async fn find_open_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>> {
        let license_plate = license_plate.to_string();
        self.execute(move |conn| {
            query_sessions(
                conn,
                "WHERE license_plate = ?1 AND end_time IS NULL
                 ORDER BY julianday(start_time) ASC, id ASC",
                params![license_plate],
            )
        })
        .await
    }

    async fn find_by_plate_and_active(
        &self,
        license_plate: &str,
        active: bool,
    ) -> Result<Option<ParkingSession>> {
        let license_plate = license_plate.to_string();
        self.execute(move |conn| {
            let sessions = query_sessions(
                conn,
                "WHERE license_plate = ?1 AND is_active = ?2
                 ORDER BY julianday(start_time) DESC, id DESC
                 LIMIT 1",
                params![license_plate, active],
            )?;
            Ok(sessions.into_iter().next())
        })
        .await
    }

    async fn list_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>> {
        let license_plate = license_plate.to_string();
        self.execute(move |conn| {
            query_sessions(
                conn,
                "WHERE license_plate = ?1
                 ORDER BY julianday(start_time) DESC, id DESC",
                params![license_plate],
            )
        })
        .await
    }
}
