use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use log::{error, info, warn};

use crate::{
    billing::{price_interval, truncate_to_minute, BillingConfig, Charge},
    clock::Clock,
    db::models::ParkingSession,
    error::{ParkingError, Result},
    store::SessionStore,
};

/// Drives parking sessions from open to closed and bills the stay.
///
/// Each operation performs at most one `save`; every validation runs before
/// it, so a failed call leaves the store untouched.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: Arc<BillingConfig>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        config: Arc<BillingConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Opens a session for `license_plate` on `street_name`.
    ///
    /// Fails with `UnknownStreet` for unpriced streets and with
    /// `SessionAlreadyActive` when the plate is still parked somewhere.
    pub async fn start_session(
        &self,
        license_plate: &str,
        street_name: &str,
    ) -> Result<ParkingSession> {
        if !self.config.pricing.contains(street_name) {
            error!("Invalid street: {street_name}");
            return Err(ParkingError::UnknownStreet(street_name.to_string()));
        }

        if let Some(active) = self
            .store
            .find_by_plate_and_active(license_plate, true)
            .await?
        {
            warn!(
                "License plate {license_plate} already parked on {} since {}",
                active.street_name, active.start_time
            );
            return Err(ParkingError::SessionAlreadyActive(license_plate.to_string()));
        }

        let session = ParkingSession::open(license_plate, street_name, self.now().fixed_offset());
        let saved = self.store.save(&session).await?;

        info!(
            "Started parking session {} for {license_plate} on {street_name} at {}",
            saved.id.as_deref().unwrap_or("?"),
            saved.start_time
        );
        Ok(saved)
    }

    /// Closes the open session for `license_plate` and records its cost.
    pub async fn end_session(&self, license_plate: &str) -> Result<ParkingSession> {
        let mut open = self.store.find_open_by_plate(license_plate).await?;
        if open.is_empty() {
            error!("No session found for: {license_plate}");
            return Err(ParkingError::NoActiveSession(license_plate.to_string()));
        }
        if open.len() > 1 {
            warn!(
                "{} open sessions for {license_plate}; closing the oldest",
                open.len()
            );
        }

        let mut session = open.swap_remove(0);
        let end_time = self.now();
        let charge = price_interval(
            &self.config,
            &session.street_name,
            session.start_time.with_timezone(&self.config.time_zone),
            end_time,
        )?;

        session.close(end_time.fixed_offset(), charge.cost);
        let saved = self.store.save(&session).await?;

        info!(
            "Ended parking session {} for {license_plate}: {} chargeable minutes, cost {}",
            saved.id.as_deref().unwrap_or("?"),
            charge.chargeable_minutes,
            saved.cost
        );
        Ok(saved)
    }

    /// Prices an interval given as wall-clock readings in the configured
    /// zone, without touching the store.
    pub fn quote(
        &self,
        street_name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Charge> {
        let start = self.config.localize(start)?;
        let end = self.config.localize(end)?;
        price_interval(&self.config, street_name, start, end)
    }

    /// All sessions recorded for `license_plate`, newest first.
    pub async fn history(&self, license_plate: &str) -> Result<Vec<ParkingSession>> {
        Ok(self.store.list_by_plate(license_plate).await?)
    }

    fn now(&self) -> DateTime<Tz> {
        truncate_to_minute(self.clock.now().with_timezone(&self.config.time_zone))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{FixedOffset, NaiveDate, TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::{
        billing::{FreeWindow, HolidayCalendar},
        clock::FixedClock,
        store::InMemorySessionStore,
    };

    const ZONE: Tz = Tz::Europe__Amsterdam;

    /// Clock the test can move forward between calls.
    struct SteppingClock(Mutex<DateTime<Tz>>);

    impl SteppingClock {
        fn at(local: NaiveDateTime) -> Arc<Self> {
            let start = FixedClock::at_local(ZONE, local).unwrap().now();
            Arc::new(Self(Mutex::new(start)))
        }

        fn set(&self, local: NaiveDateTime) {
            self.set_instant(FixedClock::at_local(ZONE, local).unwrap().now());
        }

        fn set_instant(&self, instant: DateTime<Tz>) {
            *self.0.lock().unwrap() = instant;
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Tz> {
            *self.0.lock().unwrap()
        }
    }

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn instant(local: NaiveDateTime) -> DateTime<FixedOffset> {
        ZONE.from_local_datetime(&local).unwrap().fixed_offset()
    }

    fn config(holidays: &[&str]) -> Arc<BillingConfig> {
        Arc::new(BillingConfig::new(
            [("Java".to_string(), 15)].into_iter().collect(),
            FreeWindow::parse("20:59", "08:00").unwrap(),
            HolidayCalendar::parse(holidays).unwrap(),
            ZONE,
        ))
    }

    fn manager(
        store: &Arc<InMemorySessionStore>,
        config: Arc<BillingConfig>,
        clock: Arc<SteppingClock>,
    ) -> SessionManager {
        SessionManager::new(store.clone(), config, clock)
    }

    #[tokio::test]
    async fn start_truncates_to_the_minute() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(4, 10, 7, 42));
        let manager = manager(&store, config(&[]), clock);

        let session = manager.start_session("ABC123", "Java").await.unwrap();

        assert!(session.id.is_some());
        assert_eq!(session.license_plate, "ABC123");
        assert_eq!(session.street_name, "Java");
        assert_eq!(session.start_time.naive_local(), at(4, 10, 7, 0));
        assert!(session.is_open());
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn start_on_unknown_street_writes_nothing() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = manager(&store, config(&[]), SteppingClock::at(at(4, 10, 0, 0)));

        let err = manager.start_session("TN1234", "Jakarta").await.unwrap_err();

        assert!(matches!(err, ParkingError::UnknownStreet(ref s) if s == "Jakarta"));
        assert_eq!(
            err.to_string(),
            "No street found for street name: Jakarta"
        );
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_start_for_parked_plate_is_rejected() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = manager(&store, config(&[]), SteppingClock::at(at(4, 10, 0, 0)));

        manager.start_session("ABC123", "Java").await.unwrap();
        let err = manager.start_session("ABC123", "Java").await.unwrap_err();

        assert!(matches!(err, ParkingError::SessionAlreadyActive(_)));
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn end_bills_three_daytime_minutes() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(4, 10, 0, 0));
        let manager = manager(&store, config(&[]), clock.clone());

        manager.start_session("ABC123", "Java").await.unwrap();
        clock.set(at(4, 10, 3, 59));
        let ended = manager.end_session("ABC123").await.unwrap();

        assert_eq!(ended.end_time.map(|t| t.naive_local()), Some(at(4, 10, 3, 0)));
        assert_eq!(ended.cost, 0.45);
        assert!(!ended.is_active);
        assert!(store.find_open_by_plate("ABC123").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_after_weekend_costs_27() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(1, 20, 0, 0));
        let manager = manager(&store, config(&[]), clock.clone());

        manager.start_session("ABC123", "Java").await.unwrap();
        clock.set(at(3, 10, 0, 0));
        let ended = manager.end_session("ABC123").await.unwrap();

        assert_eq!(ended.cost, 27.0);
    }

    #[tokio::test]
    async fn end_after_holiday_costs_27() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(1, 20, 0, 0));
        let manager = manager(&store, config(&["2025-03-03"]), clock.clone());

        manager.start_session("ABC123", "Java").await.unwrap();
        clock.set(at(4, 10, 0, 0));
        let ended = manager.end_session("ABC123").await.unwrap();

        assert_eq!(ended.cost, 27.0);
    }

    #[tokio::test]
    async fn end_without_open_session_fails() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = manager(&store, config(&[]), SteppingClock::at(at(4, 10, 0, 0)));

        let err = manager.end_session("ABC123").await.unwrap_err();

        assert!(matches!(err, ParkingError::NoActiveSession(ref p) if p == "ABC123"));
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_fails_when_street_was_unpriced_meanwhile() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(4, 10, 0, 0));
        let opening = manager(&store, config(&[]), clock.clone());
        let opened = opening.start_session("ABC123", "Java").await.unwrap();

        let repriced = Arc::new(BillingConfig::new(
            [("Kotlin".to_string(), 10)].into_iter().collect(),
            FreeWindow::parse("20:59", "08:00").unwrap(),
            HolidayCalendar::default(),
            ZONE,
        ));
        let closing = manager(&store, repriced, clock.clone());
        clock.set(at(4, 11, 0, 0));
        let err = closing.end_session("ABC123").await.unwrap_err();

        assert!(matches!(err, ParkingError::UnknownStreet(_)));
        assert_eq!(store.snapshot().unwrap(), vec![opened]);
    }

    #[tokio::test]
    async fn clock_running_backwards_is_an_invalid_interval() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(4, 10, 0, 0));
        let manager = manager(&store, config(&[]), clock.clone());

        manager.start_session("ABC123", "Java").await.unwrap();
        clock.set(at(4, 9, 0, 0));
        let err = manager.end_session("ABC123").await.unwrap_err();

        assert!(matches!(err, ParkingError::InvalidInterval { .. }));
        assert_eq!(store.find_open_by_plate("ABC123").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn end_in_repeated_hour_after_clocks_go_back() {
        let store = Arc::new(InMemorySessionStore::new());
        // Amsterdam 2025-10-26: start 02:30 CEST, end 02:10 CET.
        let start = Utc.with_ymd_and_hms(2025, 10, 26, 0, 30, 0).unwrap();
        let clock = Arc::new(SteppingClock(Mutex::new(start.with_timezone(&ZONE))));
        let manager = manager(&store, config(&[]), clock.clone());

        let started = manager.start_session("ABC123", "Java").await.unwrap();
        clock.set_instant((start + TimeDelta::minutes(40)).with_timezone(&ZONE));
        let ended = manager.end_session("ABC123").await.unwrap();

        let end_time = ended.end_time.unwrap();
        assert!(end_time.naive_local() < started.start_time.naive_local());
        assert_eq!(end_time - ended.start_time, TimeDelta::minutes(40));
        assert_eq!(ended.start_time.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(end_time.offset().local_minus_utc(), 3600);
        assert_eq!(ended.cost, 0.0);
        assert!(!ended.is_active);
    }

    #[tokio::test]
    async fn quote_rejects_skipped_local_time() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = manager(&store, config(&[]), SteppingClock::at(at(4, 10, 0, 0)));
        let gap = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();

        let err = manager.quote("Java", gap, at(31, 10, 0, 0)).unwrap_err();

        assert!(matches!(err, ParkingError::NonexistentLocalTime(t) if t == gap));
    }

    #[tokio::test]
    async fn oldest_open_session_is_closed_first() {
        let store = Arc::new(InMemorySessionStore::new());
        // Legacy data: two open sessions for one plate.
        store
            .save(&ParkingSession::open("ABC123", "Java", instant(at(4, 9, 0, 0))))
            .await
            .unwrap();
        store
            .save(&ParkingSession::open("ABC123", "Java", instant(at(4, 9, 30, 0))))
            .await
            .unwrap();
        let manager = manager(&store, config(&[]), SteppingClock::at(at(4, 10, 0, 0)));

        let ended = manager.end_session("ABC123").await.unwrap();

        assert_eq!(ended.start_time, instant(at(4, 9, 0, 0)));
        assert_eq!(ended.cost, Charge::new(60, 15).cost);
        let still_open = store.find_open_by_plate("ABC123").await.unwrap();
        assert_eq!(still_open.len(), 1);
        assert_eq!(still_open[0].start_time, instant(at(4, 9, 30, 0)));
    }

    #[tokio::test]
    async fn quote_and_history() {
        let store = Arc::new(InMemorySessionStore::new());
        let clock = SteppingClock::at(at(4, 10, 0, 0));
        let manager = manager(&store, config(&[]), clock.clone());

        let charge = manager
            .quote("Java", at(4, 10, 0, 0), at(4, 10, 0, 0) + TimeDelta::minutes(5))
            .unwrap();
        assert_eq!(charge.chargeable_minutes, 5);
        assert_eq!(charge.cost, 0.75);

        manager.start_session("ABC123", "Java").await.unwrap();
        clock.set(at(4, 11, 0, 0));
        manager.end_session("ABC123").await.unwrap();
        manager.start_session("ABC123", "Java").await.unwrap();

        let history = manager.history("ABC123").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_open());
        assert_eq!(history[1].cost, 9.0);
    }
}
