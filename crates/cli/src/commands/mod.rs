//! Subcommands shared by one-shot invocations and the interactive shell.

pub mod account;
pub mod admin;
pub mod parking;

use clap::Subcommand;

use parkline_app::{AppError, AppState};
use parkline_core::{LotId, ReservationId};

/// Every action the front end offers.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and open the matching dashboard
    Login {
        /// Account name (`admin` gets the admin role in demo mode)
        username: String,

        /// Account password
        #[arg(short, long, env = "PARKLINE_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    /// Create an account
    Register {
        /// Account name
        username: String,

        /// Contact email
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Password again
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Show the dashboard for the current session
    Dashboard,
    /// Manage parking lots
    Lots {
        #[command(subcommand)]
        action: LotsAction,
    },
    /// List registered users (admin)
    Users,
    /// Book a spot in a lot
    Book {
        /// Lot to book in
        lot_id: LotId,
    },
    /// Release a held spot
    Release {
        /// Reservation to close
        reservation_id: ReservationId,
    },
    /// List your reservations
    Reservations,
    /// Export your reservation history as CSV
    Export {
        /// Directory to write the file into
        #[arg(short, long, default_value = ".")]
        dir: std::path::PathBuf,
    },
    /// Inspect the background scheduler (remote mode)
    Scheduler {
        #[command(subcommand)]
        action: SchedulerAction,
    },
    /// Dismiss all notices
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum LotsAction {
    /// List lots, optionally filtered by name, address or postal code
    List {
        /// Search text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a lot (admin)
    Create {
        /// Lot name
        #[arg(short, long)]
        name: String,

        /// Street address
        #[arg(short, long, default_value = "")]
        address: String,

        /// Postal code
        #[arg(long, default_value = "")]
        pincode: String,

        /// Hourly rate
        #[arg(long)]
        price: String,

        /// Number of spots
        #[arg(short, long)]
        total: String,
    },
    /// Edit a lot (admin); omitted fields keep their current value
    Update {
        /// Lot to edit
        id: LotId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        address: Option<String>,

        #[arg(long)]
        pincode: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(short, long)]
        total: Option<String>,
    },
    /// Delete an empty lot (admin)
    Delete {
        /// Lot to delete
        id: LotId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SchedulerAction {
    /// Show scheduler state and jobs
    Status,
    /// Run a job now
    Trigger {
        /// Job name
        #[arg(default_value = "test_job")]
        job: String,
    },
}

/// Run one command against the application state.
///
/// # Errors
///
/// Returns the action's error; it has already been posted as a notice.
pub async fn execute(app: &mut AppState, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login { username, password } => account::login(app, &username, &password).await,
        Command::Register {
            username,
            email,
            password,
            confirm_password,
        } => account::register(app, username, email, password, confirm_password).await,
        Command::Logout => app.logout().await,
        Command::Whoami => {
            account::whoami(app);
            Ok(())
        }
        Command::Dashboard => account::dashboard(app).await,
        Command::Lots { action } => admin::lots(app, action).await,
        Command::Users => admin::users(app).await,
        Command::Book { lot_id } => parking::book(app, lot_id).await,
        Command::Release { reservation_id } => parking::release(app, reservation_id).await,
        Command::Reservations => parking::reservations(app).await,
        Command::Export { dir } => parking::export(app, &dir).await,
        Command::Scheduler { action } => admin::scheduler(app, action).await,
        Command::Clear => {
            app.clear_messages();
            Ok(())
        }
    }
}
