//! Dashboard aggregation and chart series.
//!
//! Everything here is a pure function of the current lots and reservations.
//! Nothing is cached: callers recompute on every refresh.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parkline_core::LotId;

use crate::models::{ParkingLot, Reservation};

/// Summary figures for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(alias = "total_parking_lots")]
    pub total_lots: u64,
    pub total_spots: u64,
    pub available_spots: u64,
    pub occupied_spots: u64,
    #[serde(default)]
    pub active_reservations: u64,
    #[serde(default)]
    pub total_users: u64,
}

impl DashboardStats {
    /// Recompute from scratch.
    #[must_use]
    pub fn compute(lots: &[ParkingLot], reservations: &[Reservation], total_users: u64) -> Self {
        let mut stats = Self {
            total_lots: lots.len() as u64,
            total_users,
            ..Self::default()
        };
        for lot in lots {
            stats.total_spots += u64::from(lot.total());
            stats.available_spots += u64::from(lot.available());
            stats.occupied_spots += u64::from(lot.occupied());
        }
        stats.active_reservations = reservations.iter().filter(|r| r.is_active()).count() as u64;
        stats
    }

    /// Whether the spot totals add up.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.available_spots + self.occupied_spots == self.total_spots
    }
}

/// One lot's row in the occupancy comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyRow {
    pub lot_name: String,
    pub available: u32,
    pub occupied: u32,
}

/// Per-lot occupancy, in catalog order.
#[must_use]
pub fn occupancy_series(lots: &[ParkingLot]) -> Vec<OccupancyRow> {
    lots.iter()
        .map(|lot| OccupancyRow {
            lot_name: lot.name.clone(),
            available: lot.available(),
            occupied: lot.occupied(),
        })
        .collect()
}

/// Active versus completed reservation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActivityCounts {
    pub active: usize,
    pub completed: usize,
}

/// Count reservations by status.
#[must_use]
pub fn activity_counts(reservations: &[Reservation]) -> ActivityCounts {
    let active = reservations.iter().filter(|r| r.is_active()).count();
    ActivityCounts {
        active,
        completed: reservations.len() - active,
    }
}

/// Total spent per lot over completed reservations, in first-seen order.
///
/// Grouped by lot ID and labelled with the lot's name, so two lots that
/// share a name stay separate. Sums saturate at `Decimal::MAX`.
#[must_use]
pub fn spending_by_lot(reservations: &[Reservation]) -> Vec<(String, Decimal)> {
    let mut totals: Vec<(LotId, String, Decimal)> = Vec::new();
    for reservation in reservations.iter().filter(|r| !r.is_active()) {
        match totals.iter_mut().find(|(id, _, _)| *id == reservation.lot_id) {
            Some((_, _, sum)) => *sum = sum.saturating_add(reservation.cost),
            None => totals.push((
                reservation.lot_id,
                reservation.lot_name.clone(),
                reservation.cost,
            )),
        }
    }
    totals
        .into_iter()
        .map(|(_, name, sum)| (name, sum))
        .collect()
}

// =============================================================================
// Charts
// =============================================================================

/// Chart shape a renderer should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Doughnut,
    Bar,
    Pie,
}

/// One labelled series of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Decimal>,
}

/// A chart ready to draw: labels on one axis, one or more datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Shown instead of the chart when there is nothing to plot.
    pub placeholder: Option<String>,
}

impl Chart {
    fn new(title: &str, kind: ChartKind, labels: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            kind,
            labels,
            datasets: Vec::new(),
            placeholder: None,
        }
    }

    fn dataset(mut self, label: &str, data: impl IntoIterator<Item = Decimal>) -> Self {
        self.datasets.push(Dataset {
            label: label.to_string(),
            data: data.into_iter().collect(),
        });
        self
    }

    fn empty(title: &str, kind: ChartKind, message: &str) -> Self {
        Self {
            placeholder: Some(message.to_string()),
            ..Self::new(title, kind, Vec::new())
        }
    }

    /// Whether there is anything to draw.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.placeholder.is_some()
    }
}

/// The charts belonging to one dashboard view.
///
/// Owned by the view and replaced wholesale on each redraw, so a stale chart
/// never outlives the data it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSet {
    charts: Vec<Chart>,
}

impl ChartSet {
    /// Occupancy doughnut plus per-lot comparison bars.
    #[must_use]
    pub fn admin(stats: &DashboardStats, lots: &[ParkingLot]) -> Self {
        let occupancy = Chart::new(
            "Overall Occupancy",
            ChartKind::Doughnut,
            vec!["Available Spots".to_string(), "Occupied Spots".to_string()],
        )
        .dataset(
            "Spots",
            [
                Decimal::from(stats.available_spots),
                Decimal::from(stats.occupied_spots),
            ],
        );

        let comparison = if lots.is_empty() {
            Chart::empty("Lots Comparison", ChartKind::Bar, "No parking lots to display")
        } else {
            let rows = occupancy_series(lots);
            Chart::new(
                "Lots Comparison",
                ChartKind::Bar,
                rows.iter().map(|row| row.lot_name.clone()).collect(),
            )
            .dataset("Available", rows.iter().map(|row| Decimal::from(row.available)))
            .dataset("Occupied", rows.iter().map(|row| Decimal::from(row.occupied)))
        };

        Self {
            charts: vec![occupancy, comparison],
        }
    }

    /// Activity bars plus spending pie.
    #[must_use]
    pub fn user(reservations: &[Reservation]) -> Self {
        let counts = activity_counts(reservations);
        let activity = Chart::new(
            "My Activity",
            ChartKind::Bar,
            vec!["Active".to_string(), "Completed".to_string()],
        )
        .dataset(
            "Number of Reservations",
            [Decimal::from(counts.active), Decimal::from(counts.completed)],
        );

        let spending = spending_by_lot(reservations);
        let spending = if spending.is_empty() {
            Chart::empty("Spending by Lot", ChartKind::Pie, "No spending data yet")
        } else {
            let (labels, data): (Vec<_>, Vec<_>) = spending.into_iter().unzip();
            Chart::new("Spending by Lot", ChartKind::Pie, labels).dataset("Spent", data)
        };

        Self {
            charts: vec![activity, spending],
        }
    }

    /// The charts, in display order.
    #[must_use]
    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    /// Look up a chart by title.
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&Chart> {
        self.charts.iter().find(|chart| chart.title == title)
    }

    /// Replace every chart with a freshly built set.
    pub fn redraw(&mut self, fresh: Self) {
        *self = fresh;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parkline_core::{ReservationId, ReservationStatus};

    use super::*;

    fn lots() -> Vec<ParkingLot> {
        vec![
            ParkingLot::with_occupancy(LotId::new(1), "City Center Parking", Decimal::from(40), 50, 32)
                .unwrap(),
            ParkingLot::with_occupancy(LotId::new(2), "Mall Parking", Decimal::from(30), 80, 38)
                .unwrap(),
            ParkingLot::with_occupancy(LotId::new(3), "Airport Parking", Decimal::from(60), 120, 55)
                .unwrap(),
        ]
    }

    fn reservation(
        id: i64,
        lot_id: i64,
        lot: &str,
        status: ReservationStatus,
        cost: i64,
    ) -> Reservation {
        Reservation {
            id: ReservationId::new(id),
            lot_id: LotId::new(lot_id),
            lot_name: lot.to_string(),
            username: "demo".to_string(),
            spot_number: 1,
            parked_at: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
            left_at: None,
            status,
            cost: Decimal::from(cost),
        }
    }

    fn history() -> Vec<Reservation> {
        vec![
            reservation(101, 1, "City Center Parking", ReservationStatus::Active, 40),
            reservation(102, 2, "Mall Parking", ReservationStatus::Completed, 90),
            reservation(103, 3, "Airport Parking", ReservationStatus::Completed, 180),
            reservation(104, 2, "Mall Parking", ReservationStatus::Completed, 60),
        ]
    }

    #[test]
    fn test_compute_stats() {
        let stats = DashboardStats::compute(&lots(), &history(), 42);
        assert_eq!(stats.total_lots, 3);
        assert_eq!(stats.total_spots, 250);
        assert_eq!(stats.available_spots, 125);
        assert_eq!(stats.occupied_spots, 125);
        assert_eq!(stats.active_reservations, 1);
        assert_eq!(stats.total_users, 42);
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_compute_empty() {
        let stats = DashboardStats::compute(&[], &[], 0);
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_stats_accept_legacy_lot_count_name() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"total_parking_lots": 2, "total_spots": 10, "available_spots": 4, "occupied_spots": 6}"#,
        )
        .unwrap();
        assert_eq!(stats.total_lots, 2);
        assert_eq!(stats.total_users, 0);
    }

    #[test]
    fn test_spending_groups_in_first_seen_order() {
        let spending = spending_by_lot(&history());
        assert_eq!(
            spending,
            vec![
                ("Mall Parking".to_string(), Decimal::from(150)),
                ("Airport Parking".to_string(), Decimal::from(180)),
            ]
        );
    }

    #[test]
    fn test_spending_keeps_same_named_lots_apart() {
        let history = vec![
            reservation(1, 1, "Central", ReservationStatus::Completed, 40),
            reservation(2, 4, "Central", ReservationStatus::Completed, 25),
            reservation(3, 1, "Central", ReservationStatus::Completed, 10),
        ];
        let spending = spending_by_lot(&history);
        assert_eq!(
            spending,
            vec![
                ("Central".to_string(), Decimal::from(50)),
                ("Central".to_string(), Decimal::from(25)),
            ]
        );
    }

    #[test]
    fn test_spending_saturates_instead_of_overflowing() {
        let mut big = reservation(1, 1, "Luxury", ReservationStatus::Completed, 0);
        big.cost = Decimal::MAX;
        let mut more = big.clone();
        more.id = ReservationId::new(2);

        let spending = spending_by_lot(&[big, more]);
        assert_eq!(spending, vec![("Luxury".to_string(), Decimal::MAX)]);
    }

    #[test]
    fn test_activity_counts() {
        let counts = activity_counts(&history());
        assert_eq!(counts, ActivityCounts { active: 1, completed: 3 });
    }

    #[test]
    fn test_admin_charts() {
        let lots = lots();
        let stats = DashboardStats::compute(&lots, &[], 0);
        let charts = ChartSet::admin(&stats, &lots);
        let bars = charts.get("Lots Comparison").unwrap();
        assert_eq!(bars.labels.len(), 3);
        assert_eq!(bars.datasets.len(), 2);
        assert_eq!(bars.datasets[1].data[0], Decimal::from(32));

        let empty = ChartSet::admin(&DashboardStats::default(), &[]);
        assert!(empty.get("Lots Comparison").unwrap().is_empty());
    }

    #[test]
    fn test_user_charts_without_completed_history() {
        let active_only = vec![reservation(1, 1, "X", ReservationStatus::Active, 10)];
        let charts = ChartSet::user(&active_only);
        assert!(charts.get("Spending by Lot").unwrap().is_empty());
        assert!(!charts.get("My Activity").unwrap().is_empty());
    }

    #[test]
    fn test_redraw_replaces_charts() {
        let mut charts = ChartSet::user(&history());
        charts.redraw(ChartSet::user(&[]));
        assert!(charts.get("Spending by Lot").unwrap().is_empty());
        assert_eq!(charts.charts().len(), 2);
    }
}
