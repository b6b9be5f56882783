pub mod observations;
pub mod sessions;
