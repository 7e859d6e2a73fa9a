//! Error types for remessa.
//!
//! This module defines all error types used throughout the remessa crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for remessa operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Remote Store Errors ===
    /// The remote backend could not be reached or answered with a
    /// non-success status. Always recovered locally by the service layer.
    #[error("remote store unavailable: {message}")]
    RemoteUnavailable {
        /// Description of the failure.
        message: String,
    },

    // === Backup Errors ===
    /// A backup payload could not be parsed as a record collection.
    /// Nothing is imported when this is returned.
    #[error("malformed backup payload: {message}")]
    MalformedBackup {
        /// Description of what was wrong with the payload.
        message: String,
    },

    // === Session Errors ===
    /// Credentials did not match any configured account.
    #[error("access denied: unknown identifier or wrong secret")]
    AccessDenied,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::RemoteUnavailable {
            message: e.to_string(),
        }
    }
}

/// Result type alias for remessa operations.
pub type Result<T> = std::result::Result<T, Error>;
