pub mod billing;
pub mod cli;
pub mod clock;
pub mod db;
pub mod error;
pub mod parking;
pub mod reporting;
pub mod settings;
pub mod store;

use clap::Parser;

pub use billing::{BillingConfig, Charge};
pub use db::{Database, LicensePlateObservation, ParkingSession};
pub use error::ParkingError;
pub use parking::SessionManager;
pub use store::{InMemorySessionStore, SessionStore};

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::dispatch(cli))
}
