//! Command-line entry and dispatch.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use crate::{
    clock::SystemClock,
    db::{models::LicensePlateObservation, Database},
    parking::SessionManager,
    reporting::{run_report, ReportScheduler},
    settings::Settings,
};

#[derive(Parser, Debug)]
#[command(name = "streetpark")]
#[command(version)]
#[command(about = "Street parking sessions and billing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: $STREETPARK_CONFIG or ./streetpark.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a parking session
    Start {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        street: String,
    },
    /// End the active session for a plate and print its cost
    End {
        #[arg(long)]
        plate: String,
    },
    /// Price an interval on a street without recording anything
    Quote {
        #[arg(long)]
        street: String,
        /// Local start time, e.g. 2025-03-01T20:00
        #[arg(long, value_parser = parse_local_arg)]
        start: NaiveDateTime,
        /// Local end time, e.g. 2025-03-03T10:00
        #[arg(long, value_parser = parse_local_arg)]
        end: NaiveDateTime,
    },
    /// List recorded sessions for a plate, newest first
    History {
        #[arg(long)]
        plate: String,
    },
    /// Replace the observation log with a JSON array of observations
    Observe {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List priced streets and their price per minute
    Streets,
    /// Write the unregistered plates report
    Report {
        /// Keep running and rewrite the report on the configured interval
        #[arg(long)]
        watch: bool,
    },
}

fn parse_local_arg(raw: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("invalid local time '{raw}', expected YYYY-MM-DDTHH:MM"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let settings_path = Settings::resolve_path(cli.config);
    let settings = Settings::load(&settings_path)?;
    let config = Arc::new(
        settings
            .billing_config()
            .context("invalid billing configuration")?,
    );

    let db = Database::new(settings.database_path.clone())?;
    let manager = SessionManager::new(
        Arc::new(db.clone()),
        config.clone(),
        Arc::new(SystemClock::new(config.time_zone)),
    );

    match cli.command {
        Command::Start { plate, street } => {
            print_json(&manager.start_session(&plate, &street).await?)
        }
        Command::End { plate } => print_json(&manager.end_session(&plate).await?),
        Command::Quote { street, start, end } => {
            print_json(&manager.quote(&street, start, end)?)
        }
        Command::History { plate } => print_json(&manager.history(&plate).await?),
        Command::Streets => {
            let streets: BTreeMap<&str, u32> = config.pricing.streets().collect();
            print_json(&streets)
        }
        Command::Observe { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read observations from {}", file.display()))?;
            let observations: Vec<LicensePlateObservation> = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse observations in {}", file.display()))?;
            let stored = db.replace_observations(&observations).await?;
            info!("Observations uploaded: {stored}");
            println!("Observations uploaded.");
            Ok(())
        }
        Command::Report { watch: false } => {
            let unregistered = run_report(&db, &settings.report_path).await?;
            print_json(&unregistered)
        }
        Command::Report { watch: true } => {
            let mut scheduler =
                ReportScheduler::new(Duration::from_secs(settings.report_interval_secs));
            scheduler.start(db.clone(), settings.report_path.clone())?;
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            scheduler.stop().await
        }
    }
}
