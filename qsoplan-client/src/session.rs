//! Login session persistence
//!
//! Holds the JWT access/refresh pair and the profile of the logged-in
//! user, persisted as pretty-printed JSON so a session survives between
//! invocations. A missing file simply means logged out; an unreadable
//! one is treated the same way rather than blocking startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::models::UserProfile;

/// Tokens and profile of a logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer token sent with every authenticated request
    pub access: String,
    /// Longer-lived token used to mint a fresh access token
    pub refresh: String,
    pub user: UserProfile,
}

/// Persistent store for the current session
pub struct SessionStore {
    session: Option<Session>,

    /// Path to the session JSON file
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by the given file and hydrate it
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut store = Self {
            session: None,
            path,
        };
        store.hydrate();
        Ok(store)
    }

    /// Default session file under the platform data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("qsoplan")
            .join("session.json")
    }

    /// Load the session from disk
    ///
    /// Missing file means logged out. A file that fails to parse is
    /// logged and ignored so a corrupt session never blocks the client;
    /// the user just has to log in again.
    pub fn hydrate(&mut self) {
        if !self.path.exists() {
            debug!("No existing session file at {:?}", self.path);
            self.session = None;
            return;
        }

        match fs::read_to_string(&self.path) {
            Ok(json) => match serde_json::from_str::<Session>(&json) {
                Ok(session) => {
                    info!("Restored session for {}", session.user.call_sign);
                    self.session = Some(session);
                }
                Err(e) => {
                    warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                    self.session = None;
                }
            },
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                self.session = None;
            }
        }
    }

    /// Replace the current session and persist it
    pub fn set(&mut self, session: Session) -> Result<()> {
        info!("Logged in as {}", session.user.call_sign);
        self.session = Some(session);
        self.save()
    }

    /// Swap in a freshly minted access token and persist
    pub fn update_access(&mut self, access: String) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.access = access;
            debug!("Refreshed access token for {}", session.user.call_sign);
        }
        self.save()
    }

    /// Replace the stored profile copy, keeping the tokens
    pub fn update_user(&mut self, user: UserProfile) -> Result<()> {
        if let Some(session) = self.session.as_mut() {
            session.user = user;
        }
        self.save()
    }

    /// Drop the session and delete the file
    pub fn clear(&mut self) -> Result<()> {
        self.session = None;
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            debug!("Removed session file {:?}", self.path);
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Current session, or [`ClientError::NotLoggedIn`]
    pub fn require(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(ClientError::NotLoggedIn)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        match &self.session {
            Some(session) => {
                let json = serde_json::to_string_pretty(session)?;
                fs::write(&self.path, json)?;
                debug!("Saved session to {:?}", self.path);
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                }
            }
        }
        Ok(())
    }
}
