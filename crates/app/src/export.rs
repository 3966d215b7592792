//! CSV export of reservation history.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::Reservation;

const HEADER: &str = "Reservation ID,Parking Lot,Spot,Parked At,Left At,Duration (hours),Status,Cost";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Download name for an export made on `date`.
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("parking_history_{}.csv", date.format("%Y-%m-%d"))
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render reservations as CSV, one row per reservation in the given order.
#[must_use]
pub fn reservations_csv(reservations: &[Reservation]) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for r in reservations {
        let left_at = r
            .left_at
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        let hours = r.stay_hours().map(|h| format!("{h:.2}")).unwrap_or_default();
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{:.2}",
            r.id,
            escape(&r.lot_name),
            r.spot_number,
            r.parked_at.format(TIMESTAMP_FORMAT),
            left_at,
            hours,
            r.status,
            r.cost
        );
    }
    csv
}
