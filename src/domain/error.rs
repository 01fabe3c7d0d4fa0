//! Domain-level error types for chat-archive.
//!
//! All errors are typed with `thiserror` and carry enough context to be
//! shown to end users directly.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Archive database not found at expected location.
    #[error("Archive database not found at: {path}")]
    DatabaseNotFound { path: PathBuf },

    /// Failed to open or query the database.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid or corrupted data in the archive.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON serialization failed.
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error. Fatal for an export job.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Reading a session's history failed.
    #[error("Scan failed for session {session}: {message}")]
    Scan { session: String, message: String },

    /// Serializing or persisting an export artifact failed.
    #[error("Write error: {message}")]
    Write { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The owning context went away while a job was suspended.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Create a database error from rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a JSON error.
    pub fn json(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Wrap any failure that happened while reading a session.
    pub fn scan(session: impl Into<String>, err: &Self) -> Self {
        Self::Scan {
            session: session.into(),
            message: err.to_string(),
        }
    }

    /// Create a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::write(format!("spreadsheet encoding failed: {err}"))
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
