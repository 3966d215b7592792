//! Login, registration and dashboard commands.

use parkline_app::models::RegistrationForm;
use parkline_app::{AppError, AppState, View};

use crate::render;

/// Log in, then show the dashboard the session lands on.
pub async fn login(app: &mut AppState, username: &str, password: &str) -> Result<(), AppError> {
    app.login(username, password).await?;
    show_dashboard(app);
    Ok(())
}

pub async fn register(
    app: &mut AppState,
    username: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<(), AppError> {
    app.navigate(View::Register);
    let form = RegistrationForm {
        username,
        email,
        password,
        confirm_password,
    };
    app.register(&form).await
}

#[allow(clippy::print_stdout)]
pub fn whoami(app: &AppState) {
    match app.session() {
        Some(session) => println!(
            "{} ({}) via {} backend",
            session.username(),
            session.identity().role,
            app.mode()
        ),
        None => println!("Not logged in ({} backend)", app.mode()),
    }
}

/// Reload and print the dashboard for the current session.
pub async fn dashboard(app: &mut AppState) -> Result<(), AppError> {
    app.refresh().await?;
    show_dashboard(app);
    Ok(())
}

fn show_dashboard(app: &AppState) {
    match app.view() {
        View::AdminDashboard => {
            render::stats(&app.admin().stats);
            render::lots(app, &app.admin().lots.iter().collect::<Vec<_>>());
            render::charts(&app.admin().charts);
        }
        View::UserDashboard => {
            render::lots(app, &app.user().lots.iter().collect::<Vec<_>>());
            render::reservations(app, &app.user().reservations);
            render::charts(&app.user().charts);
        }
        View::Login | View::Register => {}
    }
}
