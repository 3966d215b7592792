//! Domain models: lots, reservations, accounts and sessions.

pub mod lot;
pub mod reservation;
pub mod session;
pub mod user;

pub use lot::{LotInput, ParkingLot, ValidLotInput};
pub use reservation::{ReleaseReceipt, Reservation};
pub use session::{Identity, SchedulerJob, SchedulerStatus, Session};
pub use user::{LoginRequest, Registration, RegistrationForm, UserSummary};
