//! Session handling for remessa.
//!
//! A deliberately small login gate: credentials are fixed
//! identifier/secret pairs from configuration, and the active session is a
//! plain JSON value persisted in the local key-value store. This is a
//! convenience gate for a single-operator tool, not a security boundary —
//! no hashing, no expiry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Account;
use crate::error::{Error, Result};
use crate::store::LocalStore;

/// Fixed key the session blob is stored under.
const SESSION_KEY: &str = "session";

/// The active login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Stable account id (position of the account in configuration).
    pub id: String,
    /// Display name of the logged-in account.
    pub name: String,
    /// The identifier used to log in, lowercased.
    pub identifier: String,
    /// When the session started, epoch milliseconds.
    pub logged_in_at: i64,
}

/// Credential check and session persistence.
#[derive(Debug)]
pub struct SessionStore {
    store: LocalStore,
}

impl SessionStore {
    /// Create a session store over an open local store.
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Open a session store on the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(LocalStore::open(path)?))
    }

    /// Check credentials against the configured accounts and, on success,
    /// persist and return the new session.
    ///
    /// The identifier is matched case-insensitively, the secret exactly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] when no account matches, or a
    /// database error if the session cannot be persisted.
    pub fn authenticate(
        &self,
        accounts: &[Account],
        identifier: &str,
        secret: &str,
    ) -> Result<Session> {
        let identifier = identifier.trim().to_lowercase();

        let matched = accounts
            .iter()
            .enumerate()
            .find(|(_, account)| account.identifier == identifier && account.secret == secret);

        let Some((index, account)) = matched else {
            warn!("Rejected login for identifier {identifier:?}");
            return Err(Error::AccessDenied);
        };

        let session = Session {
            id: (index + 1).to_string(),
            name: account.display_name.clone(),
            identifier,
            logged_in_at: Utc::now().timestamp_millis(),
        };
        self.store
            .kv_put(SESSION_KEY, &serde_json::to_string(&session)?)?;
        info!("Session started for {}", session.name);
        Ok(session)
    }

    /// The persisted session, if any.
    ///
    /// A corrupt session blob is treated as "not logged in".
    ///
    /// # Errors
    ///
    /// Returns an error only if the database cannot be read.
    pub fn current(&self) -> Result<Option<Session>> {
        let Some(blob) = self.store.kv_get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Session blob is corrupt, treating as logged out: {e}");
                Ok(None)
            }
        }
    }

    /// Clear the persisted session. No-op when not logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn end(&self) -> Result<()> {
        self.store.kv_delete(SESSION_KEY)?;
        info!("Session ended");
        Ok(())
    }
}
