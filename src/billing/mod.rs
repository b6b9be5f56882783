pub mod calculator;
pub mod calendar;
pub mod config;
pub mod pricing;

pub use calculator::{chargeable_minutes, price_interval, truncate_to_minute, Charge};
pub use calendar::{FreeWindow, HolidayCalendar};
pub use config::BillingConfig;
pub use pricing::PricingTable;
