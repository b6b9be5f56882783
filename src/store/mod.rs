//! Session store abstraction.
//!
//! The session manager only talks to this trait; [`crate::db::Database`]
//! implements it on SQLite and [`InMemorySessionStore`] keeps records in a map.

use anyhow::Result;
use async_trait::async_trait;

use crate::db::models::ParkingSession;

mod memory;

pub use memory::InMemorySessionStore;

/// Persistence contract for parking sessions.
///
/// Implementations must return open sessions ordered by `start_time` and then
/// `id`, so that callers picking the first entry get the oldest one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or updates a session, assigning an id on first insert.
    ///
    /// Returns the record as stored.
    async fn save(&self, session: &ParkingSession) -> Result<ParkingSession>;

    /// All sessions for `license_plate` that have no end time.
    async fn find_open_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>>;

    /// One session for `license_plate` whose active flag equals `active`.
    ///
    /// Picks the most recently started match.
    async fn find_by_plate_and_active(
        &self,
        license_plate: &str,
        active: bool,
    ) -> Result<Option<ParkingSession>>;

    /// Every session for `license_plate`, newest first.
    async fn list_by_plate(&self, license_plate: &str) -> Result<Vec<ParkingSession>>;
}

pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
