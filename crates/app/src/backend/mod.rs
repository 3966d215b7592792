//! Backend abstraction.
//!
//! Every data operation goes through [`ParkingBackend`]. Two implementations
//! exist: [`DemoBackend`] keeps fabricated data in memory, [`RemoteBackend`]
//! talks to the parking REST service. One is chosen at startup from
//! [`AppConfig::mode`] and the rest of the application never branches on it.

mod demo;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use parkline_core::{LotId, ReservationId};

use crate::config::{AppConfig, BackendMode};
use crate::dashboard::DashboardStats;
use crate::error::AppError;
use crate::models::{
    ParkingLot, Registration, ReleaseReceipt, Reservation, SchedulerStatus, Session, UserSummary,
    ValidLotInput,
};

pub use demo::{DEMO_TOKEN, DemoBackend};
pub use remote::RemoteBackend;

/// Operations a parking backend provides.
///
/// Authenticated calls take the current [`Session`]; admin calls fail with
/// `AppError::Unauthorized` for non-admin sessions.
#[async_trait]
pub trait ParkingBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendMode;

    /// Exchange credentials for a session.
    async fn login(&self, username: &str, password: &str) -> Result<Session, AppError>;

    /// Create an account.
    async fn register(&self, registration: &Registration) -> Result<(), AppError>;

    /// Platform-wide statistics (admin).
    async fn dashboard_stats(&self, session: &Session) -> Result<DashboardStats, AppError>;

    /// Every lot (admin).
    async fn admin_lots(&self, session: &Session) -> Result<Vec<ParkingLot>, AppError>;

    /// Add a lot (admin).
    async fn create_lot(
        &self,
        session: &Session,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError>;

    /// Edit a lot (admin).
    async fn update_lot(
        &self,
        session: &Session,
        id: LotId,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError>;

    /// Remove an empty lot (admin).
    async fn delete_lot(&self, session: &Session, id: LotId) -> Result<(), AppError>;

    /// Registered accounts (admin).
    async fn list_users(&self, session: &Session) -> Result<Vec<UserSummary>, AppError>;

    /// Lots a user can book in.
    async fn user_lots(&self, session: &Session) -> Result<Vec<ParkingLot>, AppError>;

    /// Book a spot.
    async fn book(&self, session: &Session, lot_id: LotId) -> Result<Reservation, AppError>;

    /// Release a held spot.
    async fn release(
        &self,
        session: &Session,
        id: ReservationId,
    ) -> Result<ReleaseReceipt, AppError>;

    /// The session user's reservations, newest first.
    async fn reservations(&self, session: &Session) -> Result<Vec<Reservation>, AppError>;

    /// The session user's history as CSV.
    async fn export_csv(&self, session: &Session) -> Result<String, AppError>;

    /// Background scheduler status.
    async fn scheduler_status(&self, session: &Session) -> Result<SchedulerStatus, AppError>;

    /// Run a scheduled job now.
    async fn trigger_job(&self, session: &Session, job: &str) -> Result<(), AppError>;
}

/// Build the backend selected by configuration.
///
/// # Errors
///
/// Returns `AppError::Remote` if the HTTP client cannot be built.
pub fn build_backend(config: &AppConfig) -> Result<Arc<dyn ParkingBackend>, AppError> {
    let backend: Arc<dyn ParkingBackend> = match config.mode {
        BackendMode::Demo => Arc::new(DemoBackend::seeded()),
        BackendMode::Remote => Arc::new(RemoteBackend::new(
            config.api_url.clone(),
            config.request_timeout,
        )?),
    };
    tracing::info!(mode = %config.mode, "Backend selected");
    Ok(backend)
}
