//! Booking, release and history commands.

use std::path::Path;

use chrono::Local;

use parkline_app::{AppError, AppState};
use parkline_core::{LotId, ReservationId};

use crate::render;

pub async fn book(app: &mut AppState, lot_id: LotId) -> Result<(), AppError> {
    let reservation = app.book(lot_id).await?;
    render::reservations(app, std::slice::from_ref(&reservation));
    Ok(())
}

pub async fn release(app: &mut AppState, id: ReservationId) -> Result<(), AppError> {
    app.release(id).await?;
    Ok(())
}

pub async fn reservations(app: &mut AppState) -> Result<(), AppError> {
    app.load_user_dashboard().await?;
    render::reservations(app, &app.user().reservations);
    render::charts(&app.user().charts);
    Ok(())
}

pub async fn export(app: &mut AppState, dir: &Path) -> Result<(), AppError> {
    let path = app.export_csv(dir, Local::now().date_naive()).await?;
    tracing::debug!(path = %path.display(), "Export written");
    Ok(())
}
