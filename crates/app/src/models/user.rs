//! User-facing account models: registration forms and the admin user list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parkline_core::{Email, Password, UserId, Username};

use crate::error::AppError;

/// A registered account as listed on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Account ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// When the account was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Raw registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Registration request after validation.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: Password,
}

impl RegistrationForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when a field is blank, the passwords
    /// differ, the password is too short, or the email is malformed.
    pub fn validate(&self) -> Result<Registration, AppError> {
        if self.username.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(AppError::Validation("Please fill all fields".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        Ok(Registration {
            password: Password::parse(&self.password)?,
            username: Username::parse(&self.username)?,
            email: Email::parse(&self.email)?,
        })
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}
