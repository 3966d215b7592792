//! Parking lot domain models.
//!
//! The spot counters are private: the only way to move a spot between
//! `available` and `occupied` is [`ParkingLot::occupy_spot`] and
//! [`ParkingLot::vacate_spot`], which change both sides together so
//! `available + occupied == total` always holds.
//!
//! Spot numbers run from 1 to `total`. A booking always gets the lowest
//! number not currently held, so a released spot is handed out again
//! before any higher one.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parkline_core::LotId;

use crate::error::AppError;

/// A parking facility with a fixed spot capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LotRecord")]
pub struct ParkingLot {
    /// Unique lot ID.
    pub id: LotId,
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// Postal code.
    #[serde(rename = "pincode", default)]
    pub postal_code: String,
    /// Hourly rate.
    pub price_per_hour: Decimal,
    #[serde(rename = "total_spots")]
    total: u32,
    #[serde(rename = "available_spots")]
    available: u32,
    #[serde(rename = "occupied_spots")]
    occupied: u32,
    /// Spots `1..=high_water` have been handed out, minus `released`.
    #[serde(skip)]
    high_water: u32,
    /// Released spot numbers below `high_water`.
    #[serde(skip)]
    released: BTreeSet<u32>,
}

/// Wire shape of a lot, checked before it becomes a [`ParkingLot`].
#[derive(Deserialize)]
struct LotRecord {
    id: LotId,
    name: String,
    #[serde(default)]
    address: String,
    #[serde(rename = "pincode", default)]
    postal_code: String,
    price_per_hour: Decimal,
    total_spots: u32,
    available_spots: u32,
    occupied_spots: u32,
}

impl TryFrom<LotRecord> for ParkingLot {
    type Error = String;

    fn try_from(record: LotRecord) -> Result<Self, Self::Error> {
        let counted = u64::from(record.available_spots) + u64::from(record.occupied_spots);
        if counted != u64::from(record.total_spots) {
            return Err(format!(
                "lot {}: available ({}) + occupied ({}) does not equal total ({})",
                record.id, record.available_spots, record.occupied_spots, record.total_spots
            ));
        }
        Ok(Self::assemble(
            record.id,
            record.name,
            record.price_per_hour,
            record.total_spots,
            record.occupied_spots,
        )
        .located_at(record.address, record.postal_code))
    }
}

impl ParkingLot {
    /// Caller guarantees `occupied <= total`. Spots `1..=occupied` are held.
    fn assemble(id: LotId, name: String, price_per_hour: Decimal, total: u32, occupied: u32) -> Self {
        Self {
            id,
            name,
            address: String::new(),
            postal_code: String::new(),
            price_per_hour,
            total,
            available: total - occupied,
            occupied,
            high_water: occupied,
            released: BTreeSet::new(),
        }
    }

    /// Create an empty lot from validated input.
    #[must_use]
    pub fn from_input(id: LotId, input: &ValidLotInput) -> Self {
        Self::assemble(id, input.name.clone(), input.price_per_hour, input.total_spots, 0)
            .located_at(input.address.clone(), input.postal_code.clone())
    }

    /// Create a lot that already has `occupied` spots taken, numbered
    /// `1..=occupied`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `occupied` exceeds `total`.
    pub fn with_occupancy(
        id: LotId,
        name: impl Into<String>,
        price_per_hour: Decimal,
        total: u32,
        occupied: u32,
    ) -> Result<Self, AppError> {
        if occupied > total {
            return Err(AppError::Validation(format!(
                "occupied spots ({occupied}) exceed total spots ({total})"
            )));
        }
        Ok(Self::assemble(id, name.into(), price_per_hour, total, occupied))
    }

    /// Set the address fields.
    #[must_use]
    pub fn located_at(mut self, address: impl Into<String>, postal_code: impl Into<String>) -> Self {
        self.address = address.into();
        self.postal_code = postal_code.into();
        self
    }

    /// Total spot count.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Free spots.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Taken spots.
    #[must_use]
    pub const fn occupied(&self) -> u32 {
        self.occupied
    }

    /// True when no spot can be booked.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.available == 0
    }

    /// Whether spot number `spot` is currently held.
    #[must_use]
    pub fn is_held(&self, spot: u32) -> bool {
        spot >= 1 && spot <= self.high_water && !self.released.contains(&spot)
    }

    /// Whether the counters satisfy `available + occupied == total` and agree
    /// with the set of held spot numbers.
    ///
    /// Decoding rejects lots whose counters do not add up, so this only
    /// fails if a lot was corrupted in memory.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let held = u64::from(self.high_water) - self.released.len() as u64;
        u64::from(self.available) + u64::from(self.occupied) == u64::from(self.total)
            && held == u64::from(self.occupied)
            && self.high_water <= self.total
    }

    /// Move one spot from available to occupied; returns the spot number,
    /// the lowest one not currently held.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CapacityExhausted` if no spot is free. The lot is
    /// left untouched on error.
    pub fn occupy_spot(&mut self) -> Result<u32, AppError> {
        if self.available == 0 {
            return Err(AppError::CapacityExhausted {
                lot_name: self.name.clone(),
            });
        }
        let spot = match self.released.pop_first() {
            Some(spot) => spot,
            None => {
                self.high_water += 1;
                self.high_water
            }
        };
        self.available -= 1;
        self.occupied += 1;
        Ok(spot)
    }

    /// Give spot number `spot` back, moving one spot from occupied to
    /// available.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if that spot is not held. The lot is
    /// left untouched on error.
    pub fn vacate_spot(&mut self, spot: u32) -> Result<(), AppError> {
        if !self.is_held(spot) {
            return Err(AppError::InvalidState(format!(
                "Spot {spot} in {} is not occupied",
                self.name
            )));
        }
        self.released.insert(spot);
        while self.high_water > 0 && self.released.remove(&self.high_water) {
            self.high_water -= 1;
        }
        self.occupied -= 1;
        self.available += 1;
        Ok(())
    }

    /// Apply edited fields. A changed total keeps every occupied spot and
    /// recomputes availability from it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the new total is smaller than the
    /// number of occupied spots, or would drop a spot number still held.
    pub fn apply_update(&mut self, input: &ValidLotInput) -> Result<(), AppError> {
        if input.total_spots < self.occupied {
            return Err(AppError::Validation(format!(
                "Total spots cannot be less than the {} currently occupied",
                self.occupied
            )));
        }
        if input.total_spots < self.high_water {
            return Err(AppError::Validation(format!(
                "Spot {0} is occupied; total spots must be at least {0}",
                self.high_water
            )));
        }
        self.name.clone_from(&input.name);
        self.address.clone_from(&input.address);
        self.postal_code.clone_from(&input.postal_code);
        self.price_per_hour = input.price_per_hour;
        self.total = input.total_spots;
        self.available = input.total_spots - self.occupied;
        Ok(())
    }

    /// Case-insensitive match on name or address, substring match on postal code.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let lower = query.to_lowercase();
        self.name.to_lowercase().contains(&lower)
            || self.address.to_lowercase().contains(&lower)
            || self.postal_code.contains(query)
    }
}

/// Raw lot form as typed by an admin.
///
/// Every field is a string, the way a form delivers it; [`LotInput::validate`]
/// turns it into a [`ValidLotInput`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LotInput {
    /// Lot name (required).
    pub name: String,
    /// Street address (optional).
    pub address: String,
    /// Postal code (optional).
    pub postal_code: String,
    /// Hourly rate (required, positive).
    pub price_per_hour: String,
    /// Spot capacity (required, positive).
    pub total_spots: String,
}

/// Lot fields after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidLotInput {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "pincode", default)]
    pub postal_code: String,
    pub price_per_hour: Decimal,
    pub total_spots: u32,
}

impl LotInput {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when name, price or total spots is
    /// missing, or when price/total are not positive numbers.
    pub fn validate(&self) -> Result<ValidLotInput, AppError> {
        let name = self.name.trim();
        let price = self.price_per_hour.trim();
        let total = self.total_spots.trim();
        if name.is_empty() || price.is_empty() || total.is_empty() {
            return Err(AppError::Validation(
                "Please fill all required fields".to_string(),
            ));
        }

        let price_per_hour = price
            .parse::<Decimal>()
            .ok()
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| {
                AppError::Validation("Price per hour must be a positive number".to_string())
            })?;
        let total_spots = total
            .parse::<u32>()
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(|| {
                AppError::Validation("Total spots must be a positive whole number".to_string())
            })?;

        Ok(ValidLotInput {
            name: name.to_string(),
            address: self.address.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            price_per_hour,
            total_spots,
        })
    }
}

impl ValidLotInput {
    /// Fill blank address fields with placeholders, as the demo backend does.
    #[must_use]
    pub fn with_placeholders(mut self) -> Self {
        if self.address.is_empty() {
            self.address = "Demo Address".to_string();
        }
        if self.postal_code.is_empty() {
            self.postal_code = "000000".to_string();
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn city_center() -> ParkingLot {
        ParkingLot::with_occupancy(LotId::new(1), "City Center Parking", Decimal::from(40), 50, 32)
            .unwrap()
            .located_at("12 MG Road", "560001")
    }

    fn form(name: &str, price: &str, total: &str) -> LotInput {
        LotInput {
            name: name.to_string(),
            price_per_hour: price.to_string(),
            total_spots: total.to_string(),
            ..LotInput::default()
        }
    }

    #[test]
    fn test_occupy_and_vacate_keep_invariant() {
        let mut lot = city_center();
        assert_eq!(lot.available(), 18);

        let spot = lot.occupy_spot().unwrap();
        assert_eq!(spot, 33);
        assert_eq!((lot.available(), lot.occupied()), (17, 33));
        assert!(lot.is_consistent());

        lot.vacate_spot(spot).unwrap();
        assert_eq!((lot.available(), lot.occupied()), (18, 32));
        assert!(lot.is_consistent());
    }

    #[test]
    fn test_released_spot_is_reused_before_higher_numbers() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Small", Decimal::from(10), 5, 0).unwrap();
        let first = lot.occupy_spot().unwrap();
        let second = lot.occupy_spot().unwrap();
        assert_eq!((first, second), (1, 2));

        lot.vacate_spot(first).unwrap();
        let third = lot.occupy_spot().unwrap();
        assert_eq!(third, 1);
        assert_ne!(third, second);
        assert_eq!(lot.occupy_spot().unwrap(), 3);
        assert!(lot.is_consistent());
    }

    #[test]
    fn test_vacating_top_spots_lowers_the_next_number() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Small", Decimal::from(10), 5, 3).unwrap();
        lot.vacate_spot(2).unwrap();
        lot.vacate_spot(3).unwrap();
        assert!(lot.is_held(1));
        assert!(!lot.is_held(2));
        assert_eq!(lot.occupy_spot().unwrap(), 2);
        assert_eq!(lot.occupy_spot().unwrap(), 3);
        assert!(lot.is_consistent());
    }

    #[test]
    fn test_vacate_unheld_spot_fails_without_mutation() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Small", Decimal::from(10), 5, 2).unwrap();
        lot.vacate_spot(1).unwrap();
        let before = lot.clone();

        for spot in [0, 1, 3, 6] {
            assert!(matches!(lot.vacate_spot(spot), Err(AppError::InvalidState(_))));
        }
        assert_eq!(lot, before);
    }

    #[test]
    fn test_occupy_full_lot_fails_without_mutation() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Tiny", Decimal::from(10), 1, 1).unwrap();
        let before = lot.clone();
        let err = lot.occupy_spot().unwrap_err();
        assert!(matches!(err, AppError::CapacityExhausted { .. }));
        assert_eq!(lot, before);
    }

    #[test]
    fn test_vacate_empty_lot_fails() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Empty", Decimal::from(10), 5, 0).unwrap();
        assert!(matches!(lot.vacate_spot(1), Err(AppError::InvalidState(_))));
        assert_eq!(lot.available(), 5);
    }

    #[test]
    fn test_with_occupancy_rejects_overflow() {
        assert!(ParkingLot::with_occupancy(LotId::new(1), "X", Decimal::ONE, 3, 4).is_err());
    }

    #[test]
    fn test_apply_update_recomputes_available() {
        let mut lot = city_center();
        let input = form("City Center", "45", "60").validate().unwrap();
        lot.apply_update(&input).unwrap();
        assert_eq!(lot.total(), 60);
        assert_eq!(lot.occupied(), 32);
        assert_eq!(lot.available(), 28);
        assert_eq!(lot.price_per_hour, Decimal::from(45));
    }

    #[test]
    fn test_apply_update_below_occupied_is_rejected() {
        let mut lot = city_center();
        let before = lot.clone();
        let input = form("City Center", "40", "10").validate().unwrap();
        assert!(matches!(lot.apply_update(&input), Err(AppError::Validation(_))));
        assert_eq!(lot, before);
    }

    #[test]
    fn test_apply_update_keeps_held_high_spot() {
        let mut lot =
            ParkingLot::with_occupancy(LotId::new(9), "Small", Decimal::from(10), 10, 5).unwrap();
        for spot in 1..=4 {
            lot.vacate_spot(spot).unwrap();
        }
        let before = lot.clone();

        let shrink = form("Small", "10", "3").validate().unwrap();
        let err = lot.apply_update(&shrink).unwrap_err();
        assert_eq!(err.user_message(), "Spot 5 is occupied; total spots must be at least 5");
        assert_eq!(lot, before);

        let keep = form("Small", "10", "5").validate().unwrap();
        lot.apply_update(&keep).unwrap();
        assert_eq!((lot.available(), lot.occupied()), (4, 1));
        assert!(lot.is_consistent());
    }

    #[test]
    fn test_validate_requires_fields() {
        let err = form("", "40", "10").validate().unwrap_err();
        assert_eq!(err.user_message(), "Please fill all required fields");
        assert!(form("X", "", "10").validate().is_err());
        assert!(form("X", "40", " ").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_numbers() {
        assert!(form("X", "0", "10").validate().is_err());
        assert!(form("X", "-5", "10").validate().is_err());
        assert!(form("X", "40", "0").validate().is_err());
        assert!(form("X", "forty", "10").validate().is_err());
        assert!(form("X", "40", "2.5").validate().is_err());
    }

    #[test]
    fn test_validate_accepts_decimal_price() {
        let valid = form(" X ", "12.50", "10").validate().unwrap();
        assert_eq!(valid.name, "X");
        assert_eq!(valid.price_per_hour, Decimal::new(1250, 2));
        assert_eq!(valid.total_spots, 10);
    }

    #[test]
    fn test_placeholders_fill_blank_address() {
        let valid = form("X", "40", "10").validate().unwrap().with_placeholders();
        assert_eq!(valid.address, "Demo Address");
        assert_eq!(valid.postal_code, "000000");
    }

    #[test]
    fn test_matches_name_address_and_postal_code() {
        let lot = city_center();
        assert!(lot.matches("city"));
        assert!(lot.matches("MG ROAD"));
        assert!(lot.matches("5600"));
        assert!(lot.matches("  "));
        assert!(!lot.matches("airport"));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(city_center()).unwrap();
        assert_eq!(json["pincode"], "560001");
        assert_eq!(json["total_spots"], 50);
        assert_eq!(json["available_spots"], 18);
        assert_eq!(json["occupied_spots"], 32);
    }

    #[test]
    fn test_decode_rejects_unbalanced_counters() {
        let unbalanced = json!({
            "id": 7,
            "name": "Broken",
            "price_per_hour": "20",
            "total_spots": 10,
            "available_spots": 10,
            "occupied_spots": 5
        });
        let err = serde_json::from_value::<ParkingLot>(unbalanced).unwrap_err();
        assert!(err.to_string().contains("does not equal total"));

        let balanced = json!({
            "id": 7,
            "name": "Fine",
            "price_per_hour": "20",
            "total_spots": 10,
            "available_spots": 5,
            "occupied_spots": 5
        });
        let mut lot: ParkingLot = serde_json::from_value(balanced).unwrap();
        assert!(lot.is_consistent());
        assert_eq!(lot.occupy_spot().unwrap(), 6);
    }

    #[test]
    fn test_decode_tolerates_missing_address() {
        let lot: ParkingLot = serde_json::from_value(json!({
            "id": 3,
            "name": "Airport Parking",
            "price_per_hour": "60",
            "total_spots": 100,
            "available_spots": 25,
            "occupied_spots": 75
        }))
        .unwrap();
        assert!(lot.address.is_empty());
        assert_eq!(lot.occupied(), 75);
    }
}
