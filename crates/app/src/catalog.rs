//! Catalog of parking lots.
//!
//! Owns the lot collection and is the only place lots are created, edited,
//! deleted, or have spots moved between available and occupied.

use parkline_core::LotId;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{ParkingLot, ValidLotInput};

/// Capacity totals across every lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapacityTotals {
    pub total: u64,
    pub available: u64,
    pub occupied: u64,
}

const FIRST_LOT_ID: LotId = LotId::new(1);

/// In-memory lot collection.
#[derive(Debug, Clone)]
pub struct Catalog {
    lots: Vec<ParkingLot>,
    next_id: LotId,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            lots: Vec::new(),
            next_id: FIRST_LOT_ID,
        }
    }
}

impl Catalog {
    /// Empty catalog; the first lot gets ID 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with existing lots. New IDs continue after the largest
    /// existing one.
    #[must_use]
    pub fn from_lots(lots: Vec<ParkingLot>) -> Self {
        let next_id = lots
            .iter()
            .map(|lot| lot.id)
            .max()
            .map_or(FIRST_LOT_ID, |id| id.next());
        Self { lots, next_id }
    }

    /// All lots in insertion order.
    #[must_use]
    pub fn lots(&self) -> &[ParkingLot] {
        &self.lots
    }

    /// Number of lots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Look up a lot.
    #[must_use]
    pub fn get(&self, id: LotId) -> Option<&ParkingLot> {
        self.lots.iter().find(|lot| lot.id == id)
    }

    fn get_mut(&mut self, id: LotId) -> Result<&mut ParkingLot, AppError> {
        self.lots
            .iter_mut()
            .find(|lot| lot.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Parking lot {id}")))
    }

    /// Lots matching a search query; an empty query returns all lots.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&ParkingLot> {
        self.lots.iter().filter(|lot| lot.matches(query)).collect()
    }

    /// Add a new empty lot.
    pub fn create(&mut self, input: &ValidLotInput) -> ParkingLot {
        let id = self.next_id;
        self.next_id = id.next();
        let lot = ParkingLot::from_input(id, input);
        info!(lot_id = %id, name = %lot.name, total = lot.total(), "Parking lot created");
        self.lots.push(lot.clone());
        lot
    }

    /// Replace a lot's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID, or
    /// `AppError::Validation` if the new total is below the occupied count.
    pub fn update(&mut self, id: LotId, input: &ValidLotInput) -> Result<ParkingLot, AppError> {
        let lot = self.get_mut(id)?;
        lot.apply_update(input)?;
        info!(lot_id = %id, total = lot.total(), available = lot.available(), "Parking lot updated");
        Ok(lot.clone())
    }

    /// Remove a lot that has no occupied spots.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown ID and
    /// `AppError::InvalidState` while any spot is occupied.
    pub fn delete(&mut self, id: LotId) -> Result<ParkingLot, AppError> {
        let index = self
            .lots
            .iter()
            .position(|lot| lot.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Parking lot {id}")))?;
        if let Some(lot) = self.lots.get(index).filter(|lot| lot.occupied() > 0) {
            return Err(AppError::InvalidState(format!(
                "Cannot delete {} - {} spots occupied",
                lot.name,
                lot.occupied()
            )));
        }
        let lot = self.lots.remove(index);
        info!(lot_id = %id, name = %lot.name, "Parking lot deleted");
        Ok(lot)
    }

    /// Take one spot in a lot; returns the lot after the change and the spot number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::CapacityExhausted`.
    pub fn occupy(&mut self, id: LotId) -> Result<(ParkingLot, u32), AppError> {
        let lot = self.get_mut(id)?;
        let spot = lot.occupy_spot()?;
        debug!(lot_id = %id, spot, available = lot.available(), "Spot occupied");
        Ok((lot.clone(), spot))
    }

    /// Free spot number `spot` in a lot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` or `AppError::InvalidState`.
    pub fn vacate(&mut self, id: LotId, spot: u32) -> Result<ParkingLot, AppError> {
        let lot = self.get_mut(id)?;
        lot.vacate_spot(spot)?;
        debug!(lot_id = %id, spot, available = lot.available(), "Spot vacated");
        Ok(lot.clone())
    }

    /// Sum of capacity counters over all lots.
    #[must_use]
    pub fn totals(&self) -> CapacityTotals {
        self.lots
            .iter()
            .fold(CapacityTotals::default(), |acc, lot| CapacityTotals {
                total: acc.total + u64::from(lot.total()),
                available: acc.available + u64::from(lot.available()),
                occupied: acc.occupied + u64::from(lot.occupied()),
            })
    }
}
