//! Reservation lifecycle: booking and release.
//!
//! Both operations check every precondition before touching state, so a
//! failed book or release leaves the catalog and ledger exactly as they were.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use parkline_core::{LotId, ReservationId, ReservationStatus};

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::models::{ReleaseReceipt, Reservation};

/// How the billed duration of a stay is determined at release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationPolicy {
    /// Uniform random whole hours in `min..=max` (demo placeholder).
    Random { min: u32, max: u32 },
    /// Hours elapsed since parking, rounded up, at least one.
    Elapsed,
    /// Always the same number of hours.
    Fixed(u32),
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self::Random { min: 1, max: 5 }
    }
}

impl DurationPolicy {
    /// Billed hours for a stay from `parked_at` to `left_at`.
    #[must_use]
    pub fn hours(&self, parked_at: DateTime<Utc>, left_at: DateTime<Utc>) -> u32 {
        match *self {
            Self::Random { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rand::rng().random_range(lo.max(1)..=hi.max(1))
            }
            Self::Elapsed => {
                let seconds = (left_at - parked_at).num_seconds().max(0);
                let hours = (seconds + 3599) / 3600;
                u32::try_from(hours).unwrap_or(u32::MAX).max(1)
            }
            Self::Fixed(hours) => hours.max(1),
        }
    }
}

/// Every reservation ever made, newest first.
#[derive(Debug, Clone)]
pub struct Ledger {
    reservations: Vec<Reservation>,
    next_id: ReservationId,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            reservations: Vec::new(),
            next_id: ReservationId::new(1),
        }
    }
}

impl Ledger {
    /// Ledger seeded with existing reservations (newest first).
    #[must_use]
    pub fn from_reservations(reservations: Vec<Reservation>) -> Self {
        let next_id = reservations
            .iter()
            .map(|r| r.id)
            .max()
            .map_or(ReservationId::new(1), |id| id.next());
        Self {
            reservations,
            next_id,
        }
    }

    /// All reservations, newest first.
    #[must_use]
    pub fn all(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Reservations held by one user, newest first.
    #[must_use]
    pub fn for_user(&self, username: &str) -> Vec<Reservation> {
        self.reservations
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect()
    }

    /// Look up a reservation.
    #[must_use]
    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    /// Book a spot in `lot_id` for `username`.
    ///
    /// Takes a spot from the lot and prepends an active reservation priced at
    /// the lot's hourly rate.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown lot and
    /// `AppError::CapacityExhausted` when the lot is full. Nothing changes on
    /// error.
    pub fn book(
        &mut self,
        catalog: &mut Catalog,
        lot_id: LotId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AppError> {
        let (lot, spot_number) = catalog.occupy(lot_id).inspect_err(|e| {
            warn!(lot_id = %lot_id, error = %e, "Booking rejected");
        })?;

        let id = self.next_id;
        self.next_id = id.next();
        let reservation = Reservation {
            id,
            lot_id,
            lot_name: lot.name.clone(),
            username: username.to_string(),
            spot_number,
            parked_at: now,
            left_at: None,
            status: ReservationStatus::Active,
            cost: lot.price_per_hour,
        };
        self.reservations.insert(0, reservation.clone());

        info!(
            reservation_id = %id,
            lot_id = %lot_id,
            spot = spot_number,
            available = lot.available(),
            "Spot booked"
        );
        Ok(reservation)
    }

    /// Release an active reservation held by `username`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such reservation belongs to the
    /// user, and `AppError::InvalidState` if it is already completed or its
    /// cost does not fit in a `Decimal`. A second release of the same
    /// reservation is therefore rejected and never frees a second spot.
    /// Nothing changes on error.
    pub fn release(
        &mut self,
        catalog: &mut Catalog,
        id: ReservationId,
        username: &str,
        policy: DurationPolicy,
        now: DateTime<Utc>,
    ) -> Result<ReleaseReceipt, AppError> {
        let reservation = self
            .reservations
            .iter_mut()
            .find(|r| r.id == id && r.username == username)
            .ok_or_else(|| AppError::NotFound(format!("Reservation {id}")))?;

        if !reservation.is_active() {
            warn!(reservation_id = %id, "Release of completed reservation rejected");
            return Err(AppError::InvalidState(format!(
                "Reservation {id} is already completed"
            )));
        }

        let duration_hours = policy.hours(reservation.parked_at, now);
        let cost = reservation
            .cost
            .checked_mul(Decimal::from(duration_hours))
            .ok_or_else(|| {
                warn!(reservation_id = %id, duration_hours, "Release cost out of range");
                AppError::InvalidState(format!("Cost of reservation {id} is out of range"))
            })?;

        catalog.vacate(reservation.lot_id, reservation.spot_number)?;
        reservation.status = ReservationStatus::Completed;
        reservation.left_at = Some(now);
        reservation.cost = cost;

        info!(
            reservation_id = %id,
            lot_id = %reservation.lot_id,
            duration_hours,
            cost = %cost,
            "Spot released"
        );
        Ok(ReleaseReceipt {
            cost,
            duration_hours,
        })
    }

    /// Number of reservations still holding a spot.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.reservations.iter().filter(|r| r.is_active()).count()
    }
}
