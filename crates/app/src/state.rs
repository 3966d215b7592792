//! Application controller.
//!
//! `AppState` is what a front end drives: it owns the backend, the session,
//! the current view and the data each dashboard shows. Every user action
//! clears the previous notices, runs, and then posts a success or error
//! notice. A failed action leaves the previous data in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use parkline_core::{CurrencyCode, LotId, Price, ReservationId};

use crate::backend::{ParkingBackend, build_backend};
use crate::config::{AppConfig, BackendMode};
use crate::dashboard::{ChartSet, DashboardStats};
use crate::error::AppError;
use crate::export;
use crate::models::{
    LotInput, ParkingLot, RegistrationForm, ReleaseReceipt, Reservation, SchedulerStatus, Session,
    UserSummary,
};
use crate::notice::{Notice, Notices};
use crate::session::SessionStore;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Login,
    Register,
    AdminDashboard,
    UserDashboard,
}

impl View {
    /// Landing view for a logged-in session.
    #[must_use]
    pub const fn for_session(session: &Session) -> Self {
        if session.is_admin() {
            Self::AdminDashboard
        } else {
            Self::UserDashboard
        }
    }
}

/// Data behind the admin dashboard.
#[derive(Debug, Clone, Default)]
pub struct AdminDashboard {
    pub stats: DashboardStats,
    pub lots: Vec<ParkingLot>,
    pub users: Vec<UserSummary>,
    pub charts: ChartSet,
}

/// Data behind the user dashboard.
#[derive(Debug, Clone, Default)]
pub struct UserDashboard {
    pub lots: Vec<ParkingLot>,
    pub reservations: Vec<Reservation>,
    pub charts: ChartSet,
}

/// Front-end facing application state.
pub struct AppState {
    backend: Arc<dyn ParkingBackend>,
    store: SessionStore,
    currency: CurrencyCode,
    session: Option<Session>,
    view: View,
    notices: Notices,
    admin: AdminDashboard,
    user: UserDashboard,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.backend.kind())
            .field("session", &self.session)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create state around an existing backend and session store.
    #[must_use]
    pub fn new(backend: Arc<dyn ParkingBackend>, store: SessionStore, currency: CurrencyCode) -> Self {
        Self {
            backend,
            store,
            currency,
            session: None,
            view: View::Login,
            notices: Notices::default(),
            admin: AdminDashboard::default(),
            user: UserDashboard::default(),
        }
    }

    /// Create state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self::new(
            build_backend(config)?,
            SessionStore::new(&config.session_file),
            config.currency,
        ))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The active backend kind.
    #[must_use]
    pub fn mode(&self) -> BackendMode {
        self.backend.kind()
    }

    /// Current view.
    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Navigate to a view that needs no data (login or register).
    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    /// Current session, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Admin dashboard data.
    #[must_use]
    pub const fn admin(&self) -> &AdminDashboard {
        &self.admin
    }

    /// User dashboard data.
    #[must_use]
    pub const fn user(&self) -> &UserDashboard {
        &self.user
    }

    /// Format an amount in the configured currency.
    #[must_use]
    pub fn price(&self, amount: rust_decimal::Decimal) -> Price {
        Price::new(amount, self.currency)
    }

    /// Visible notices, dropping expired ones.
    pub fn notices(&mut self) -> Vec<Notice> {
        self.notices.active(Utc::now())
    }

    /// Dismiss all notices.
    pub fn clear_messages(&mut self) {
        self.notices.clear();
    }

    fn succeed(&mut self, message: impl Into<String>) {
        self.notices.success(message, Utc::now());
    }

    /// Post a failed action's error as a notice and hand it back.
    fn report<T>(&mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            warn!(error = %e, "Action failed");
            self.notices.error(e.user_message(), Utc::now());
        }
        result
    }

    fn require_session(&self) -> Result<Session, AppError> {
        self.session
            .clone()
            .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))
    }

    fn require_admin(&self) -> Result<Session, AppError> {
        let session = self.require_session()?;
        session.require_admin()?;
        Ok(session)
    }

    fn demo_suffix(&self) -> &'static str {
        match self.mode() {
            BackendMode::Demo => " (Demo Mode)",
            BackendMode::Remote => "",
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Restore a persisted session and open its dashboard.
    ///
    /// A corrupt session file is discarded and the login view is shown.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session file cannot be read at all.
    pub async fn restore(&mut self) -> Result<View, AppError> {
        match self.store.load().await {
            Ok(Some(session)) => {
                info!(username = %session.username(), "Session restored");
                self.view = View::for_session(&session);
                self.session = Some(session);
                if let Err(e) = self.refresh().await {
                    debug!(error = %e, "Dashboard refresh after restore failed");
                }
            }
            Ok(None) => self.view = View::Login,
            Err(crate::session::SessionError::Json { .. }) => {
                warn!(path = %self.store.path().display(), "Discarding unreadable session");
                self.store.clear().await?;
                self.view = View::Login;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(self.view)
    }

    /// Log in and open the matching dashboard.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; nothing is persisted on failure.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<View, AppError> {
        self.clear_messages();
        let result = self.login_inner(username, password).await;
        self.report(result)
    }

    async fn login_inner(&mut self, username: &str, password: &str) -> Result<View, AppError> {
        let session = self.backend.login(username, password).await?;
        self.store.save(&session).await?;
        info!(username = %session.username(), role = %session.identity().role, "Logged in");
        self.view = View::for_session(&session);
        self.session = Some(session);
        let message = match self.mode() {
            BackendMode::Demo => "Logged in (Demo Mode)",
            BackendMode::Remote => "Login successful!",
        };
        self.succeed(message);
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Dashboard refresh after login failed");
        }
        Ok(self.view)
    }

    /// Register an account, then return to the login view.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad form, or the backend's error.
    pub async fn register(&mut self, form: &RegistrationForm) -> Result<(), AppError> {
        self.clear_messages();
        let result = match form.validate() {
            Ok(registration) => self.backend.register(&registration).await,
            Err(e) => Err(e),
        };
        let result = self.report(result);
        if result.is_ok() {
            self.succeed("Registration successful! Please login.");
            self.view = View::Login;
        }
        result
    }

    /// Forget the session and return to the login view.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session file cannot be removed.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.session = None;
        self.admin = AdminDashboard::default();
        self.user = UserDashboard::default();
        self.view = View::Login;
        let result = self.store.clear().await.map_err(AppError::from);
        let result = self.report(result);
        if result.is_ok() {
            self.succeed("Logged out successfully");
        }
        result
    }

    // =========================================================================
    // Dashboards
    // =========================================================================

    /// Reload whichever dashboard the session lands on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session, or the backend's error.
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        match self.session.as_ref().map(Session::is_admin) {
            Some(true) => self.load_admin_dashboard().await,
            Some(false) => self.load_user_dashboard().await,
            None => self.report(Err(AppError::Unauthorized("not logged in".to_string()))),
        }
    }

    /// Fetch stats and lots and redraw the admin charts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` for non-admins, or the backend's error.
    pub async fn load_admin_dashboard(&mut self) -> Result<(), AppError> {
        let result = self.load_admin_inner().await;
        self.report(result)
    }

    /// Reload the admin dashboard after a change the backend accepted. A
    /// failed reload is posted as an error notice; the change still stands.
    async fn reload_admin(&mut self) {
        if let Err(e) = self.load_admin_dashboard().await {
            debug!(error = %e, "Admin dashboard reload failed");
        }
    }

    async fn load_admin_inner(&mut self) -> Result<(), AppError> {
        let session = self.require_admin()?;
        let stats = self.backend.dashboard_stats(&session).await?;
        let lots = self.backend.admin_lots(&session).await?;
        self.admin.charts.redraw(ChartSet::admin(&stats, &lots));
        self.admin.stats = stats;
        self.admin.lots = lots;
        Ok(())
    }

    /// Fetch lots and reservations and redraw the user charts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` without a session, or the backend's error.
    pub async fn load_user_dashboard(&mut self) -> Result<(), AppError> {
        let result = self.load_user_inner().await;
        self.report(result)
    }

    /// Reload the user dashboard after a change the backend accepted.
    async fn reload_user(&mut self) {
        if let Err(e) = self.load_user_dashboard().await {
            debug!(error = %e, "User dashboard reload failed");
        }
    }

    async fn load_user_inner(&mut self) -> Result<(), AppError> {
        let session = self.require_session()?;
        let lots = self.backend.user_lots(&session).await?;
        let reservations = self.backend.reservations(&session).await?;
        self.user.charts.redraw(ChartSet::user(&reservations));
        self.user.lots = lots;
        self.user.reservations = reservations;
        Ok(())
    }

    // =========================================================================
    // Admin actions
    // =========================================================================

    /// Validate and create a lot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad form, or the backend's error.
    pub async fn create_lot(&mut self, input: &LotInput) -> Result<ParkingLot, AppError> {
        self.clear_messages();
        let result = self.create_lot_inner(input).await;
        self.report(result)
    }

    async fn create_lot_inner(&mut self, input: &LotInput) -> Result<ParkingLot, AppError> {
        let session = self.require_admin()?;
        let valid = input.validate()?;
        let lot = self.backend.create_lot(&session, &valid).await?;
        self.succeed(format!(
            "Parking lot created successfully!{}",
            self.demo_suffix()
        ));
        self.reload_admin().await;
        Ok(lot)
    }

    /// Validate and apply an edit to a lot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a bad form or a total below the
    /// occupied count, `AppError::NotFound`, or the backend's error.
    pub async fn update_lot(&mut self, id: LotId, input: &LotInput) -> Result<ParkingLot, AppError> {
        self.clear_messages();
        let result = self.update_lot_inner(id, input).await;
        self.report(result)
    }

    async fn update_lot_inner(&mut self, id: LotId, input: &LotInput) -> Result<ParkingLot, AppError> {
        let session = self.require_admin()?;
        let valid = input.validate()?;
        let lot = self.backend.update_lot(&session, id, &valid).await?;
        self.succeed("Parking lot updated successfully!");
        self.reload_admin().await;
        Ok(lot)
    }

    /// Delete a lot once the user has confirmed. Returns whether anything
    /// was deleted; an unconfirmed call changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` while spots are occupied,
    /// `AppError::NotFound`, or the backend's error.
    pub async fn delete_lot(&mut self, id: LotId, confirmed: bool) -> Result<bool, AppError> {
        if !confirmed {
            return Ok(false);
        }
        self.clear_messages();
        let result = self.delete_lot_inner(id).await;
        self.report(result).map(|()| true)
    }

    async fn delete_lot_inner(&mut self, id: LotId) -> Result<(), AppError> {
        let session = self.require_admin()?;
        self.backend.delete_lot(&session, id).await?;
        self.succeed(format!(
            "Parking lot deleted successfully!{}",
            self.demo_suffix()
        ));
        self.reload_admin().await;
        Ok(())
    }

    /// Filter the loaded admin lots.
    #[must_use]
    pub fn search_lots(&self, query: &str) -> Vec<&ParkingLot> {
        self.admin.lots.iter().filter(|lot| lot.matches(query)).collect()
    }

    /// Fetch the registered users.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` for non-admins, or the backend's error.
    pub async fn load_users(&mut self) -> Result<&[UserSummary], AppError> {
        let result = match self.require_admin() {
            Ok(session) => self.backend.list_users(&session).await,
            Err(e) => Err(e),
        };
        self.admin.users = self.report(result)?;
        Ok(&self.admin.users)
    }

    /// Scheduler status, also posted as a notice.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn scheduler_status(&mut self) -> Result<SchedulerStatus, AppError> {
        let result = match self.require_session() {
            Ok(session) => self.backend.scheduler_status(&session).await,
            Err(e) => Err(e),
        };
        let status = self.report(result)?;
        self.succeed(format!(
            "Scheduler is {}. {} jobs scheduled.",
            if status.running { "running" } else { "stopped" },
            status.jobs.len()
        ));
        Ok(status)
    }

    /// Run a scheduled job immediately.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn trigger_job(&mut self, job: &str) -> Result<(), AppError> {
        let result = match self.require_session() {
            Ok(session) => self.backend.trigger_job(&session, job).await,
            Err(e) => Err(e),
        };
        self.report(result)?;
        self.succeed(format!("Job {job} triggered"));
        Ok(())
    }

    // =========================================================================
    // User actions
    // =========================================================================

    /// Book a spot in a lot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CapacityExhausted`, `AppError::NotFound`, or the
    /// backend's error.
    pub async fn book(&mut self, lot_id: LotId) -> Result<Reservation, AppError> {
        self.clear_messages();
        let result = self.book_inner(lot_id).await;
        self.report(result)
    }

    async fn book_inner(&mut self, lot_id: LotId) -> Result<Reservation, AppError> {
        let session = self.require_session()?;
        let reservation = self.backend.book(&session, lot_id).await?;
        self.succeed(format!(
            "Parking spot {} booked successfully!{}",
            reservation.spot_number,
            self.demo_suffix()
        ));
        self.reload_user().await;
        Ok(reservation)
    }

    /// Release a held spot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` for a completed reservation,
    /// `AppError::NotFound`, or the backend's error.
    pub async fn release(&mut self, id: ReservationId) -> Result<ReleaseReceipt, AppError> {
        self.clear_messages();
        let result = self.release_inner(id).await;
        self.report(result)
    }

    async fn release_inner(&mut self, id: ReservationId) -> Result<ReleaseReceipt, AppError> {
        let session = self.require_session()?;
        let receipt = self.backend.release(&session, id).await?;
        self.succeed(format!(
            "Spot released! Cost: {} for {} hours{}",
            self.price(receipt.cost),
            receipt.duration_hours,
            self.demo_suffix()
        ));
        self.reload_user().await;
        Ok(receipt)
    }

    /// Write the reservation history CSV into `dir`, named for `today`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when there is no history to export,
    /// the backend's error, or `AppError::Write` if the file cannot be
    /// written.
    pub async fn export_csv(&mut self, dir: &Path, today: NaiveDate) -> Result<PathBuf, AppError> {
        self.clear_messages();
        let result = self.export_inner(dir, today).await;
        self.report(result)
    }

    async fn export_inner(&mut self, dir: &Path, today: NaiveDate) -> Result<PathBuf, AppError> {
        let session = self.require_session()?;
        if self.user.reservations.is_empty() {
            self.load_user_inner().await?;
        }
        if self.user.reservations.is_empty() {
            return Err(AppError::Validation("No reservations to export".to_string()));
        }
        let csv = self.backend.export_csv(&session).await?;
        let path = dir.join(export::file_name(today));
        tokio::fs::write(&path, csv)
            .await
            .map_err(|source| AppError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), "Reservation history exported");
        self.succeed("CSV exported successfully!");
        Ok(path)
    }
}
