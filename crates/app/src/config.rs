//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PARKLINE_MODE` - Backend selection: `demo` or `remote` (default: demo)
//! - `PARKLINE_API_URL` - Base URL of the parking REST service (default: `http://localhost:5000`)
//! - `PARKLINE_SESSION_FILE` - Where the login session is persisted (default: .parkline/session.json)
//! - `PARKLINE_REQUEST_TIMEOUT_SECS` - Remote request timeout (default: 30)
//! - `PARKLINE_CURRENCY` - Currency used to display prices (default: INR)
//! - `PARKLINE_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (0.0 to 1.0, default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use parkline_core::CurrencyCode;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_SESSION_FILE: &str = ".parkline/session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backend implementation serves the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// In-memory fake with fabricated data.
    #[default]
    Demo,
    /// REST service over HTTP.
    Remote,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demo => write!(f, "demo"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "remote" => Ok(Self::Remote),
            _ => Err(format!("invalid mode '{s}' (expected 'demo' or 'remote')")),
        }
    }
}

/// Parkline client configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend selected at startup
    pub mode: BackendMode,
    /// Base URL of the REST service (remote mode)
    pub api_url: Url,
    /// Path of the persisted login session
    pub session_file: PathBuf,
    /// Timeout applied to each remote request
    pub request_timeout: Duration,
    /// Currency used when formatting prices
    pub currency: CurrencyCode,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Demo,
            api_url: default_api_url(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            currency: CurrencyCode::default(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mode = get_or("PARKLINE_MODE", "demo")
            .parse::<BackendMode>()
            .map_err(|e| ConfigError::InvalidEnvVar("PARKLINE_MODE".to_string(), e))?;
        let api_url = parse_api_url(&get_or("PARKLINE_API_URL", DEFAULT_API_URL))?;
        let session_file = PathBuf::from(get_or("PARKLINE_SESSION_FILE", DEFAULT_SESSION_FILE));
        let timeout_secs = get_or("PARKLINE_REQUEST_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PARKLINE_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;
        let currency = get_or("PARKLINE_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("PARKLINE_CURRENCY".to_string(), e))?;
        let log_json = lookup("PARKLINE_LOG_JSON").is_some();
        let sentry_dsn = lookup("SENTRY_DSN").filter(|s| !s.is_empty());
        let sentry_environment = lookup("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = lookup("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            mode,
            api_url,
            session_file,
            request_timeout: Duration::from_secs(timeout_secs),
            currency,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
        })
    }

    /// Replace the API URL, e.g. from a command-line flag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_api_url() -> Url {
    // Constant input, validated by `test_default_api_url_parses`.
    Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("default API URL is valid"))
}

/// Parse the API base URL; only http(s) is accepted.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("PARKLINE_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "PARKLINE_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_api_url_parses() {
        assert_eq!(default_api_url().as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.mode, BackendMode::Demo);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.session_file, PathBuf::from(".parkline/session.json"));
        assert!(config.sentry_dsn.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_remote_mode_with_custom_url() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PARKLINE_MODE", "Remote"),
            ("PARKLINE_API_URL", "https://parking.example.com"),
            ("PARKLINE_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.mode, BackendMode::Remote);
        assert_eq!(config.api_url.host_str(), Some("parking.example.com"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("PARKLINE_MODE", "offline")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PARKLINE_MODE"));
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("PARKLINE_API_URL", "ftp://host")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_with_api_url_override() {
        let config = AppConfig::default()
            .with_api_url("http://127.0.0.1:8080")
            .unwrap();
        assert_eq!(config.api_url.port(), Some(8080));
        assert!(AppConfig::default().with_api_url("not a url").is_err());
    }
}
