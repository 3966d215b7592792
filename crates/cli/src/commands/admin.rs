//! Lot management, user listing and scheduler commands.

use std::io::{BufRead, Write};

use parkline_app::models::LotInput;
use parkline_app::{AppError, AppState};
use parkline_core::LotId;

use super::{LotsAction, SchedulerAction};
use crate::render;

/// Dispatch a `lots` subcommand.
pub async fn lots(app: &mut AppState, action: LotsAction) -> Result<(), AppError> {
    match action {
        LotsAction::List { search } => list(app, search.as_deref().unwrap_or_default()).await,
        LotsAction::Create {
            name,
            address,
            pincode,
            price,
            total,
        } => {
            let input = LotInput {
                name,
                address,
                postal_code: pincode,
                price_per_hour: price,
                total_spots: total,
            };
            let lot = app.create_lot(&input).await?;
            render::lots(app, &[&lot]);
            Ok(())
        }
        LotsAction::Update {
            id,
            name,
            address,
            pincode,
            price,
            total,
        } => {
            let mut input = current_form(app, id).await?;
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(address) = address {
                input.address = address;
            }
            if let Some(pincode) = pincode {
                input.postal_code = pincode;
            }
            if let Some(price) = price {
                input.price_per_hour = price;
            }
            if let Some(total) = total {
                input.total_spots = total;
            }
            let lot = app.update_lot(id, &input).await?;
            render::lots(app, &[&lot]);
            Ok(())
        }
        LotsAction::Delete { id, yes } => {
            let confirmed = yes || confirm(&format!("Delete parking lot {id}?"));
            app.delete_lot(id, confirmed).await?;
            Ok(())
        }
    }
}

async fn list(app: &mut AppState, query: &str) -> Result<(), AppError> {
    app.refresh().await?;
    let hits: Vec<_> = if app.session().is_some_and(parkline_app::models::Session::is_admin) {
        app.search_lots(query)
    } else {
        app.user().lots.iter().filter(|lot| lot.matches(query)).collect()
    };
    render::lots(app, &hits);
    Ok(())
}

/// The edit form pre-filled from the lot as it is now.
async fn current_form(app: &mut AppState, id: LotId) -> Result<LotInput, AppError> {
    app.load_admin_dashboard().await?;
    let lot = app
        .admin()
        .lots
        .iter()
        .find(|lot| lot.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Parking lot {id}")))?;
    Ok(LotInput {
        name: lot.name.clone(),
        address: lot.address.clone(),
        postal_code: lot.postal_code.clone(),
        price_per_hour: lot.price_per_hour.to_string(),
        total_spots: lot.total().to_string(),
    })
}

#[allow(clippy::print_stdout)]
fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

pub async fn users(app: &mut AppState) -> Result<(), AppError> {
    let users = app.load_users().await?;
    render::users(users);
    Ok(())
}

pub async fn scheduler(app: &mut AppState, action: SchedulerAction) -> Result<(), AppError> {
    match action {
        SchedulerAction::Status => {
            let status = app.scheduler_status().await?;
            render::scheduler(&status);
            Ok(())
        }
        SchedulerAction::Trigger { job } => app.trigger_job(&job).await,
    }
}
