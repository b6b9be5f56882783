pub mod observation;
pub mod session;

pub use observation::LicensePlateObservation;
pub use session::{ParkingSession, SessionStatus};
