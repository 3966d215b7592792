//! Registration and login credential types.
//!
//! These are the validated forms of the values a user types into the login
//! and registration forms. Parsing happens before any backend call, so a
//! malformed form never leaves the client.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing credentials.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Username is empty or whitespace.
    #[error("username cannot be empty")]
    EmptyUsername,
    /// Username contains whitespace.
    #[error("username cannot contain spaces")]
    UsernameWhitespace,
    /// Username exceeds the maximum length.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// Email is empty.
    #[error("email cannot be empty")]
    EmptyEmail,
    /// Email has no @ or an empty local/domain part.
    #[error("email must look like name@domain")]
    MalformedEmail,
    /// Password is shorter than the minimum.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// A login name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Username`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, too long, or contains spaces.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(CredentialError::UsernameTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(CredentialError::UsernameWhitespace);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with a local part and a domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, lacks an @, or has an empty
    /// local part or domain.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CredentialError::EmptyEmail);
        }
        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_owned()))
            }
            _ => Err(CredentialError::MalformedEmail),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A plaintext password on its way to the authentication service.
///
/// Implements `Debug` manually so it never reaches logs.
#[derive(Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Minimum accepted length at registration.
    pub const MIN_LENGTH: usize = 6;

    /// Parse a password for registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is shorter than
    /// [`Password::MIN_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.chars().count() < Self::MIN_LENGTH {
            return Err(CredentialError::PasswordTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the password text.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trims_and_rejects_blank() {
        assert_eq!(Username::parse("  alice ").unwrap().as_str(), "alice");
        assert_eq!(Username::parse("   "), Err(CredentialError::EmptyUsername));
        assert_eq!(
            Username::parse("alice smith"),
            Err(CredentialError::UsernameWhitespace)
        );
    }

    #[test]
    fn test_username_too_long() {
        let long = "a".repeat(Username::MAX_LENGTH + 1);
        assert!(matches!(
            Username::parse(&long),
            Err(CredentialError::UsernameTooLong { .. })
        ));
    }

    #[test]
    fn test_email_shapes() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
        assert_eq!(Email::parse(""), Err(CredentialError::EmptyEmail));
        assert_eq!(Email::parse("no-at"), Err(CredentialError::MalformedEmail));
        assert_eq!(Email::parse("@x.com"), Err(CredentialError::MalformedEmail));
        assert_eq!(Email::parse("user@"), Err(CredentialError::MalformedEmail));
        assert_eq!(Email::parse("a@b@c"), Err(CredentialError::MalformedEmail));
    }

    #[test]
    fn test_password_minimum_length() {
        assert!(Password::parse("secret").is_ok());
        assert_eq!(
            Password::parse("12345").unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::parse("hunter22").unwrap();
        let debug = format!("{password:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("REDACTED"));
    }
}
