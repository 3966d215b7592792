//! Unified error handling for the application.
//!
//! Every user action returns `Result<_, AppError>`. The presentation layer
//! turns an error into a transient notice with [`AppError::user_message`];
//! none of these are fatal and each leaves prior state unchanged.

use parkline_core::CredentialError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed form input, raised before any backend call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The lot has no free spots.
    #[error("No slots available in {lot_name}")]
    CapacityExhausted {
        /// Name of the full lot.
        lot_name: String,
    },

    /// Reservation or lot is in the wrong state for the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Referenced lot or reservation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No session, or the session lacks the required role.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Remote service failure; carries the service's `error` message.
    #[error("{0}")]
    Remote(String),

    /// A file the user asked for could not be written.
    #[error("Could not write {path}: {source}")]
    Write {
        /// Destination path.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Message shown to the user in a transient notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::InvalidState(msg) | Self::Remote(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(_) => "Please log in to continue".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error originated outside this process.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Remote("Request timed out".to_string())
        } else if err.is_connect() {
            Self::Remote("Could not reach the parking service".to_string())
        } else {
            Self::Remote(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Parking lot 7".to_string());
        assert_eq!(err.to_string(), "Not found: Parking lot 7");

        let err = AppError::CapacityExhausted {
            lot_name: "Mall Parking".to_string(),
        };
        assert_eq!(err.to_string(), "No slots available in Mall Parking");
    }

    #[test]
    fn test_user_message_passes_remote_text_through() {
        let err = AppError::Remote("Invalid credentials".to_string());
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(err.is_remote());
    }

    #[test]
    fn test_user_message_for_validation_and_not_found() {
        let err = AppError::Validation("Please fill all required fields".to_string());
        assert_eq!(err.user_message(), "Please fill all required fields");

        let err = AppError::NotFound("Parking lot".to_string());
        assert_eq!(err.user_message(), "Parking lot not found");
    }

    #[test]
    fn test_credential_error_becomes_validation() {
        let err: AppError = CredentialError::PasswordTooShort { min: 6 }.into();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.user_message(), "Password must be at least 6 characters");
    }
}
