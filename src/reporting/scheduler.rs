use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::unregistered::run_report;
use crate::db::Database;

/// Runs the unregistered-plate report on a fixed interval.
pub struct ReportScheduler {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ReportScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the report loop. The first pass runs immediately.
    pub fn start(&mut self, db: Database, report_path: PathBuf) -> Result<CancellationToken> {
        if self.handle.is_some() {
            bail!("report scheduler already running");
        }
        if self.interval.is_zero() {
            bail!("report interval must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(report_loop(
            db,
            report_path,
            self.interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token.clone());
        Ok(cancel_token)
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("report loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

async fn report_loop(
    db: Database,
    report_path: PathBuf,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Report scheduler started, every {}s", interval.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = run_report(&db, &report_path).await {
                    error!("unregistered plate report failed: {err:#}");
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Report scheduler shutting down");
                break;
            }
        }
    }
}
