//! In-memory demo backend.
//!
//! Holds a seeded catalog, reservation ledger and user list behind one
//! mutex, so every operation sees and leaves a consistent snapshot.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use parkline_core::{LotId, ReservationId, ReservationStatus, Role, UserId};

use super::ParkingBackend;
use crate::catalog::Catalog;
use crate::config::BackendMode;
use crate::dashboard::DashboardStats;
use crate::error::AppError;
use crate::export;
use crate::lifecycle::{DurationPolicy, Ledger};
use crate::models::{
    Identity, ParkingLot, Registration, ReleaseReceipt, Reservation, SchedulerStatus, Session,
    UserSummary, ValidLotInput,
};

/// Token handed out by every demo login.
pub const DEMO_TOKEN: &str = "demo-token";

/// Username that owns the seeded reservation history.
const DEMO_HISTORY_OWNER: &str = "demo";

/// Number of accounts the seeded demo pretends to have.
const SEEDED_USER_COUNT: i64 = 42;

#[derive(Debug, Default)]
struct DemoState {
    catalog: Catalog,
    ledger: Ledger,
    users: Vec<UserSummary>,
}

/// Backend that fabricates everything locally.
#[derive(Debug)]
pub struct DemoBackend {
    state: Mutex<DemoState>,
    policy: DurationPolicy,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::empty()
    }
}

impl DemoBackend {
    /// Demo with no lots, reservations or users.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(DemoState::default()),
            policy: DurationPolicy::default(),
        }
    }

    /// Demo with three lots, a short reservation history and 42 users.
    #[must_use]
    pub fn seeded() -> Self {
        let now = Utc::now();
        let lots = seed_lots();
        let reservations = seed_reservations(now);
        let users = (1..=SEEDED_USER_COUNT)
            .map(|n| {
                let username = match n {
                    1 => "admin".to_string(),
                    2 => DEMO_HISTORY_OWNER.to_string(),
                    _ => format!("user{n}"),
                };
                UserSummary {
                    id: UserId::new(n),
                    email: format!("{username}@example.com"),
                    username,
                    created_at: Some(now - Duration::days(SEEDED_USER_COUNT - n)),
                }
            })
            .collect();

        Self {
            state: Mutex::new(DemoState {
                catalog: Catalog::from_lots(lots),
                ledger: Ledger::from_reservations(reservations),
                users,
            }),
            policy: DurationPolicy::default(),
        }
    }

    /// Use a different billing duration policy on release.
    #[must_use]
    pub fn with_duration_policy(mut self, policy: DurationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Snapshot of every lot, for assertions and diagnostics.
    pub async fn lots(&self) -> Vec<ParkingLot> {
        self.state.lock().await.catalog.lots().to_vec()
    }
}

// The seeded lot occupancy already counts reservation 101.
fn seed_lots() -> Vec<ParkingLot> {
    let lot = |id: i64,
               name: &str,
               address: &str,
               pincode: &str,
               price: i64,
               total: u32,
               occupied: u32| {
        ParkingLot::with_occupancy(LotId::new(id), name, Decimal::from(price), total, occupied)
            .map(|lot| lot.located_at(address, pincode))
    };
    [
        lot(1, "City Center Parking", "12 MG Road", "560001", 40, 50, 32),
        lot(2, "Mall Parking", "Phoenix Mall, Whitefield", "560066", 30, 80, 38),
        lot(3, "Airport Parking", "Terminal 1, KIA", "560300", 60, 120, 55),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect()
}

fn seed_reservations(now: chrono::DateTime<Utc>) -> Vec<Reservation> {
    let entry = |id: i64,
                 lot_id: i64,
                 lot_name: &str,
                 spot: u32,
                 hours_ago: i64,
                 stay: Option<i64>,
                 cost: i64| {
        let parked_at = now - Duration::hours(hours_ago);
        Reservation {
            id: ReservationId::new(id),
            lot_id: LotId::new(lot_id),
            lot_name: lot_name.to_string(),
            username: DEMO_HISTORY_OWNER.to_string(),
            spot_number: spot,
            parked_at,
            left_at: stay.map(|h| parked_at + Duration::hours(h)),
            status: if stay.is_some() {
                ReservationStatus::Completed
            } else {
                ReservationStatus::Active
            },
            cost: Decimal::from(cost),
        }
    };
    vec![
        entry(101, 1, "City Center Parking", 32, 2, None, 40),
        entry(102, 2, "Mall Parking", 17, 26, Some(3), 90),
        entry(103, 3, "Airport Parking", 54, 72, Some(3), 180),
    ]
}

#[async_trait]
impl ParkingBackend for DemoBackend {
    fn kind(&self) -> BackendMode {
        BackendMode::Demo
    }

    #[instrument(skip(self, _password))]
    async fn login(&self, username: &str, _password: &str) -> Result<Session, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation(
                "Please enter username and password".to_string(),
            ));
        }
        let role = if username == "admin" {
            Role::Admin
        } else {
            Role::User
        };
        info!(username, role = %role, "Demo login");
        Ok(Session::new(DEMO_TOKEN, Identity::new(username, role)))
    }

    #[instrument(skip(self, registration), fields(username = %registration.username))]
    async fn register(&self, registration: &Registration) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.username == registration.username.as_str())
        {
            return Err(AppError::Validation("Username already exists".to_string()));
        }
        let id = state
            .users
            .iter()
            .map(|u| u.id)
            .max()
            .map_or(UserId::new(1), |id| id.next());
        state.users.push(UserSummary {
            id,
            username: registration.username.to_string(),
            email: registration.email.to_string(),
            created_at: Some(Utc::now()),
        });
        info!(user_id = %id, "Demo account registered");
        Ok(())
    }

    async fn dashboard_stats(&self, session: &Session) -> Result<DashboardStats, AppError> {
        session.require_admin()?;
        let state = self.state.lock().await;
        Ok(DashboardStats::compute(
            state.catalog.lots(),
            state.ledger.all(),
            state.users.len() as u64,
        ))
    }

    async fn admin_lots(&self, session: &Session) -> Result<Vec<ParkingLot>, AppError> {
        session.require_admin()?;
        Ok(self.state.lock().await.catalog.lots().to_vec())
    }

    #[instrument(skip(self, session, input), fields(name = %input.name))]
    async fn create_lot(
        &self,
        session: &Session,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError> {
        session.require_admin()?;
        let input = input.clone().with_placeholders();
        Ok(self.state.lock().await.catalog.create(&input))
    }

    #[instrument(skip(self, session, input))]
    async fn update_lot(
        &self,
        session: &Session,
        id: LotId,
        input: &ValidLotInput,
    ) -> Result<ParkingLot, AppError> {
        session.require_admin()?;
        self.state.lock().await.catalog.update(id, input)
    }

    #[instrument(skip(self, session))]
    async fn delete_lot(&self, session: &Session, id: LotId) -> Result<(), AppError> {
        session.require_admin()?;
        self.state.lock().await.catalog.delete(id).map(|_| ())
    }

    async fn list_users(&self, session: &Session) -> Result<Vec<UserSummary>, AppError> {
        session.require_admin()?;
        Ok(self.state.lock().await.users.clone())
    }

    async fn user_lots(&self, _session: &Session) -> Result<Vec<ParkingLot>, AppError> {
        Ok(self.state.lock().await.catalog.lots().to_vec())
    }

    #[instrument(skip(self, session), fields(username = %session.username()))]
    async fn book(&self, session: &Session, lot_id: LotId) -> Result<Reservation, AppError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state
            .ledger
            .book(&mut state.catalog, lot_id, session.username(), Utc::now())
    }

    #[instrument(skip(self, session), fields(username = %session.username()))]
    async fn release(
        &self,
        session: &Session,
        id: ReservationId,
    ) -> Result<ReleaseReceipt, AppError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ledger.release(
            &mut state.catalog,
            id,
            session.username(),
            self.policy,
            Utc::now(),
        )
    }

    async fn reservations(&self, session: &Session) -> Result<Vec<Reservation>, AppError> {
        Ok(self.state.lock().await.ledger.for_user(session.username()))
    }

    async fn export_csv(&self, session: &Session) -> Result<String, AppError> {
        let reservations = self.reservations(session).await?;
        Ok(export::reservations_csv(&reservations))
    }

    async fn scheduler_status(&self, _session: &Session) -> Result<SchedulerStatus, AppError> {
        Ok(SchedulerStatus {
            running: false,
            jobs: Vec::new(),
        })
    }

    async fn trigger_job(&self, _session: &Session, job: &str) -> Result<(), AppError> {
        Err(AppError::InvalidState(format!(
            "Cannot trigger {job}: the demo backend has no scheduler"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parkline_core::{Email, Password, Username};

    use super::*;

    async fn login(backend: &DemoBackend, username: &str) -> Session {
        backend.login(username, "whatever").await.unwrap()
    }

    #[tokio::test]
    async fn test_login_role_follows_username() {
        let backend = DemoBackend::seeded();
        let admin = login(&backend, "admin").await;
        assert!(admin.is_admin());
        let user = login(&backend, "alice").await;
        assert!(!user.is_admin());
        assert!(backend.login("  ", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_seeded_stats() {
        let backend = DemoBackend::seeded();
        let admin = login(&backend, "admin").await;
        let stats = backend.dashboard_stats(&admin).await.unwrap();
        assert_eq!(stats.total_lots, 3);
        assert_eq!(stats.total_spots, 250);
        assert_eq!(stats.available_spots, 125);
        assert_eq!(stats.occupied_spots, 125);
        assert_eq!(stats.active_reservations, 1);
        assert_eq!(stats.total_users, 42);
    }

    #[tokio::test]
    async fn test_admin_calls_reject_regular_users() {
        let backend = DemoBackend::seeded();
        let user = login(&backend, "alice").await;
        assert!(matches!(
            backend.dashboard_stats(&user).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            backend.delete_lot(&user, LotId::new(1)).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_history_belongs_to_demo_user() {
        let backend = DemoBackend::seeded();
        let demo = login(&backend, "demo").await;
        let history = backend.reservations(&demo).await.unwrap();
        let ids: Vec<_> = history.iter().map(|r| r.id.as_i64()).collect();
        assert_eq!(ids, vec![101, 102, 103]);

        let other = login(&backend, "alice").await;
        assert!(backend.reservations(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_release_seeded_reservation() {
        let backend = DemoBackend::seeded().with_duration_policy(DurationPolicy::Fixed(2));
        let demo = login(&backend, "demo").await;
        let receipt = backend.release(&demo, ReservationId::new(101)).await.unwrap();
        assert_eq!(receipt.duration_hours, 2);
        assert_eq!(receipt.cost, Decimal::from(80));

        let lots = backend.lots().await;
        let city = lots.iter().find(|l| l.id == LotId::new(1)).unwrap();
        assert_eq!((city.available(), city.occupied()), (19, 31));
    }

    #[tokio::test]
    async fn test_create_lot_fills_placeholders() {
        let backend = DemoBackend::seeded();
        let admin = login(&backend, "admin").await;
        let input = ValidLotInput {
            name: "X".to_string(),
            address: String::new(),
            postal_code: String::new(),
            price_per_hour: Decimal::from(40),
            total_spots: 10,
        };
        let lot = backend.create_lot(&admin, &input).await.unwrap();
        assert_eq!(lot.id, LotId::new(4));
        assert_eq!(lot.address, "Demo Address");
        assert_eq!(lot.postal_code, "000000");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let backend = DemoBackend::seeded();
        let registration = Registration {
            username: Username::parse("newbie").unwrap(),
            email: Email::parse("newbie@example.com").unwrap(),
            password: Password::parse("secret1").unwrap(),
        };
        backend.register(&registration).await.unwrap();
        assert!(matches!(
            backend.register(&registration).await,
            Err(AppError::Validation(_))
        ));

        let admin = login(&backend, "admin").await;
        assert_eq!(backend.list_users(&admin).await.unwrap().len(), 43);
    }

    #[tokio::test]
    async fn test_scheduler_is_unavailable() {
        let backend = DemoBackend::empty();
        let session = login(&backend, "admin").await;
        assert!(!backend.scheduler_status(&session).await.unwrap().running);
        assert!(matches!(
            backend.trigger_job(&session, "cleanup").await,
            Err(AppError::InvalidState(_))
        ));
    }
}
