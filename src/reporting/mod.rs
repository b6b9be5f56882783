//! Unregistered-plate reporting.
//!
//! A scan of the streets produces license plate observations; any observed
//! plate without an active parking session ends up in the report.

pub mod scheduler;
pub mod unregistered;

pub use scheduler::ReportScheduler;
pub use unregistered::{identify_unregistered_plates, run_report, write_report};
