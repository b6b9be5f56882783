use std::{collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{new_session_id, SessionStore};
use crate::db::models::ParkingSession;

/// Map-backed store used for dry runs and tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, ParkingSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record, oldest first.
    pub fn snapshot(&self) -> Result<Vec<ParkingSession>> {
        let mut sessions: Vec<ParkingSession> = self.lock()?.values().cloned().collect();
        sort_oldest_first(&mut sessions);
        Ok(sessions)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ParkingSession>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("in-memory session store lock poisoned"))
    }

    fn matching<F>(&self, predicate: F) -> Result<Vec<ParkingSession>>
    where
        F: Fn(&ParkingSession) -> bool,
    {
        let mut sessions: Vec<ParkingSession> = self
            .lock()?
            .values()
            .filter(|session| predicate(session))
            .cloned()
            .collect();
        sort_oldest_first(&mut sessions);
        Ok(sessions)
    }
}

fn sort_oldest_first(sessions: &mut [ParkingSession]) {
    sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &ParkingSession) -> Result<ParkingSession> {
        let mut record = session.clone();
        let id = record.id.get_or_insert_with(new_session_id).clone();
        self.lock()?.insert(id, record.clone());
        Ok(record)
    }

    async fn find_open_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>> {
        self.matching(|session| {
            session.license_plate == license_plate && session.end_time.is_none()
        })
    }

    async fn find_by_plate_and_active(
        &self,
        license_plate: &str,
        active: bool,
    ) -> Result<Option<ParkingSession>> {
        let sessions = self.matching(|session| {
            session.license_plate == license_plate && session.is_active == active
        })?;
        Ok(sessions.into_iter().last())
    }

    async fn list_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>> {
        let mut sessions = self.matching(|session| session.license_plate == license_plate)?;
        sessions.reverse();
        Ok(sessions)
    }
}
