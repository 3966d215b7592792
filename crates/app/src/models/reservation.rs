//! Reservation domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parkline_core::{LotId, ReservationId, ReservationStatus};

/// One user holding one spot in one lot.
///
/// While active, `cost` is the hourly rate captured at booking time. On
/// release it becomes the final charge for the whole stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation ID.
    pub id: ReservationId,
    /// Lot the spot belongs to.
    pub lot_id: LotId,
    /// Lot name at booking time, for display only.
    pub lot_name: String,
    /// Username of the holder.
    #[serde(default)]
    pub username: String,
    /// Spot label within the lot.
    pub spot_number: u32,
    /// When the car was parked.
    #[serde(rename = "parking_time")]
    pub parked_at: DateTime<Utc>,
    /// When the spot was released.
    #[serde(rename = "leaving_time", default)]
    pub left_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: ReservationStatus,
    /// Hourly rate while active, final charge once completed.
    pub cost: Decimal,
}

impl Reservation {
    /// Whether the spot is still held.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Length of the stay in hours, if released.
    #[must_use]
    pub fn stay_hours(&self) -> Option<f64> {
        self.left_at.map(|left| {
            #[allow(clippy::cast_precision_loss)] // Stays are hours, far below f64 precision limits
            let seconds = (left - self.parked_at).num_seconds().abs() as f64;
            seconds / 3600.0
        })
    }
}

/// Outcome of releasing a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReceipt {
    /// Final charge.
    #[serde(rename = "parking_cost")]
    pub cost: Decimal,
    /// Billed hours.
    pub duration_hours: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn reservation(left_at: Option<DateTime<Utc>>) -> Reservation {
        Reservation {
            id: ReservationId::new(101),
            lot_id: LotId::new(1),
            lot_name: "City Center Parking".to_string(),
            username: "demo".to_string(),
            spot_number: 32,
            parked_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            left_at,
            status: ReservationStatus::Active,
            cost: Decimal::from(40),
        }
    }

    #[test]
    fn test_stay_hours() {
        assert!(reservation(None).stay_hours().is_none());
        let left = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let hours = reservation(Some(left)).stay_hours().unwrap();
        assert!((hours - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(reservation(None)).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json.get("parking_time").is_some());
        assert!(json["leaving_time"].is_null());
    }

    #[test]
    fn test_receipt_wire_shape() {
        let receipt: ReleaseReceipt =
            serde_json::from_str(r#"{"parking_cost": 120, "duration_hours": 3}"#).unwrap();
        assert_eq!(receipt.cost, Decimal::from(120));
        assert_eq!(receipt.duration_hours, 3);
    }
}
