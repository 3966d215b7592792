//! Session persistence.
//!
//! The logged-in session (token plus identity) is stored as a small JSON file
//! so it survives restarts. A missing file means "logged out"; a file that
//! cannot be decoded is reported and left for the caller to clear.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Session;
use crate::models::session::StoredSession;

/// Errors from reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Filesystem failure.
    #[error("session file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The session could not be converted to or from JSON.
    #[error("session file {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file exists but cannot be read, and
    /// `SessionError::Json` if its contents are not a session.
    pub async fn load(&self) -> Result<Option<Session>, SessionError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let stored: StoredSession =
            serde_json::from_slice(&bytes).map_err(|source| SessionError::Json {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), username = %stored.user.username, "Session restored");
        Ok(Some(stored.into()))
    }

    /// Persist a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the directory or file cannot be written.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_vec_pretty(&session.to_stored()).map_err(|source| {
            SessionError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Remove the stored session. Clearing an absent session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to clear session");
                Err(self.io_error(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parkline_core::Role;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::models::Identity;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("parkline-session-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_missing_file_is_logged_out() {
        let store = SessionStore::new(temp_path("session.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = SessionStore::new(temp_path("session.json"));
        let session = Session::new("demo-token", Identity::new("admin", Role::Admin));

        store.save(&session).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.token().expose_secret(), "demo-token");
        assert!(loaded.is_admin());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_path("session.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = SessionStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(SessionError::Json { .. })
        ));
    }
}
