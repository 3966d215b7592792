//! Session-related types for authentication state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use parkline_core::Role;

use crate::error::AppError;

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name.
    pub username: String,
    /// Permission level.
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// Build an identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// An authenticated identity plus the bearer token that proves it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    identity: Identity,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        Self {
            token: SecretString::from(token.into()),
            identity,
        }
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The logged-in identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Username shortcut.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Whether the identity manages lots.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.identity.role.is_admin()
    }

    /// Fail unless the identity is an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` for non-admin identities.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("admin role required".to_string()))
        }
    }

    pub(crate) fn to_stored(&self) -> StoredSession {
        StoredSession {
            token: self.token.expose_secret().to_string(),
            user: self.identity.clone(),
        }
    }
}

/// On-disk form of a session.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub token: String,
    pub user: Identity,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(stored.token, stored.user)
    }
}

/// Status of the remote job scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the scheduler loop is running.
    pub running: bool,
    /// Scheduled job names.
    #[serde(default)]
    pub jobs: Vec<SchedulerJob>,
}

/// A scheduled background job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJob {
    /// Job identifier.
    pub id: String,
    /// Next planned run, as reported by the service.
    #[serde(default)]
    pub next_run: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("tok-abc123", Identity::new("alice", Role::User));
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("tok-abc123"));
    }

    #[test]
    fn test_require_admin() {
        let admin = Session::new("t", Identity::new("admin", Role::Admin));
        let user = Session::new("t", Identity::new("bob", Role::User));
        assert!(admin.require_admin().is_ok());
        assert!(matches!(user.require_admin(), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_stored_round_trip_keeps_token() {
        let session = Session::new("tok-xyz", Identity::new("admin", Role::Admin));
        let json = serde_json::to_string(&session.to_stored()).unwrap();
        let restored: Session = serde_json::from_str::<StoredSession>(&json).unwrap().into();
        assert_eq!(restored.token().expose_secret(), "tok-xyz");
        assert_eq!(restored.identity(), session.identity());
    }

    #[test]
    fn test_identity_role_defaults_to_user() {
        let identity: Identity = serde_json::from_str(r#"{"username": "carol"}"#).unwrap();
        assert_eq!(identity.role, Role::User);
    }
}
