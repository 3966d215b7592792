//! Parkline CLI - book parking spots and administer lots.
//!
//! # Usage
//!
//! ```bash
//! # Log in (demo mode: `admin` is an admin, anyone else a user)
//! parkline login admin
//!
//! # Admin: add, edit and remove lots
//! parkline lots create --name "Station Parking" --price 25 --total 40
//! parkline lots update 4 --total 60
//! parkline lots delete 4 --yes
//!
//! # User: book, release, export history
//! parkline book 1
//! parkline release 104
//! parkline export --dir ~/Downloads
//!
//! # Against the REST service instead of demo data
//! parkline --mode remote --api-url http://localhost:5000 login alice -p secret
//!
//! # Interactive shell
//! parkline shell
//! ```
//!
//! # Environment Variables
//!
//! - `PARKLINE_MODE`, `PARKLINE_API_URL`, `PARKLINE_SESSION_FILE`,
//!   `PARKLINE_REQUEST_TIMEOUT_SECS`, `PARKLINE_CURRENCY`, `PARKLINE_LOG_JSON`
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parkline_app::{AppConfig, AppState, BackendMode};

mod commands;
mod render;
mod shell;

#[derive(Parser)]
#[command(name = "parkline")]
#[command(author, version, about = "Parking spot booking and lot administration")]
struct Cli {
    /// Backend to use (overrides `PARKLINE_MODE`)
    #[arg(long, global = true)]
    mode: Option<BackendMode>,

    /// REST service base URL (overrides `PARKLINE_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides `PARKLINE_SESSION_FILE`)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell
    Shell,
    #[command(flatten)]
    Action(commands::Command),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr so command output stays clean on stdout.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parkline_app=warn,parkline_cli=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::from_env()?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = &cli.session_file {
        config.session_file.clone_from(path);
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Sentry's transport needs a process-wide crypto provider; a second
    // install attempt is harmless.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli.command, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = AppState::from_config(config)?;
    app.restore().await?;

    match command {
        Commands::Shell => shell::run(&mut app).await?,
        Commands::Action(action) => {
            let outcome = commands::execute(&mut app, action).await;
            render::notices(&app.notices());
            outcome?;
        }
    }
    Ok(())
}
