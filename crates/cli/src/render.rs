//! Plain-text rendering of application data.

#![allow(clippy::print_stdout)]

use parkline_app::AppState;
use parkline_app::dashboard::{Chart, ChartSet, DashboardStats};
use parkline_app::models::{ParkingLot, Reservation, SchedulerStatus, UserSummary};
use parkline_app::notice::{Notice, NoticeKind};

pub fn notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }
}

pub fn stats(stats: &DashboardStats) {
    println!("Parking lots:         {}", stats.total_lots);
    println!("Total spots:          {}", stats.total_spots);
    println!("Available spots:      {}", stats.available_spots);
    println!("Occupied spots:       {}", stats.occupied_spots);
    println!("Active reservations:  {}", stats.active_reservations);
    println!("Users:                {}", stats.total_users);
}

pub fn lots(app: &AppState, lots: &[&ParkingLot]) {
    if lots.is_empty() {
        println!("No parking lots found.");
        return;
    }
    println!(
        "{:>4}  {:<24} {:<28} {:<8} {:>10} {:>6} {:>6} {:>6}",
        "ID", "Name", "Address", "Pincode", "Rate/hr", "Total", "Free", "Used"
    );
    for lot in lots {
        println!(
            "{:>4}  {:<24} {:<28} {:<8} {:>10} {:>6} {:>6} {:>6}{}",
            lot.id,
            lot.name,
            lot.address,
            lot.postal_code,
            app.price(lot.price_per_hour).display(),
            lot.total(),
            lot.available(),
            lot.occupied(),
            if lot.is_full() { "  FULL" } else { "" }
        );
    }
}

pub fn reservations(app: &AppState, reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("No reservations yet.");
        return;
    }
    println!(
        "{:>6}  {:<24} {:>5}  {:<17} {:<17} {:<10} {:>10}",
        "ID", "Lot", "Spot", "Parked", "Left", "Status", "Cost"
    );
    for r in reservations {
        let left = r
            .left_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<24} {:>5}  {:<17} {:<17} {:<10} {:>10}",
            r.id,
            r.lot_name,
            r.spot_number,
            r.parked_at.format("%Y-%m-%d %H:%M"),
            left,
            r.status,
            app.price(r.cost).display()
        );
    }
}

pub fn users(users: &[UserSummary]) {
    println!("{:>4}  {:<20} {:<32} {:<10}", "ID", "Username", "Email", "Joined");
    for user in users {
        let joined = user
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>4}  {:<20} {:<32} {:<10}",
            user.id, user.username, user.email, joined
        );
    }
}

fn chart(chart: &Chart) {
    println!("-- {} --", chart.title);
    if let Some(placeholder) = &chart.placeholder {
        println!("   {placeholder}");
        return;
    }
    for dataset in &chart.datasets {
        if chart.datasets.len() > 1 {
            println!("   {}:", dataset.label);
        }
        for (label, value) in chart.labels.iter().zip(&dataset.data) {
            println!("   {label:<24} {value}");
        }
    }
}

pub fn charts(charts: &ChartSet) {
    for c in charts.charts() {
        chart(c);
    }
}

pub fn scheduler(status: &SchedulerStatus) {
    println!(
        "Scheduler: {}",
        if status.running { "running" } else { "stopped" }
    );
    for job in &status.jobs {
        println!(
            "  {:<24} next run: {}",
            job.id,
            job.next_run.as_deref().unwrap_or("-")
        );
    }
}
