//! Error types for the desknotes application.
//!
//! This module defines the error taxonomy shared by the note repository,
//! the HTTP server and the client-side note store.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the desknotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to JSON serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The YAML metadata header of a note file could not be read or written.
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    /// A note file does not follow the header/body layout.
    #[error("Invalid note format: {message}")]
    InvalidFormat { message: String },

    /// A note payload failed validation.
    #[error("Invalid note: {message}")]
    InvalidNote { message: String },

    /// Write or delete attempted against a read-only note.
    #[error("Note {id} is static and cannot be modified")]
    StaticNote { id: i64 },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Transport-level HTTP failure (connection refused, bad body, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The notes server answered with a non-success status.
    #[error("Server responded with {status}: {message}")]
    Remote { status: u16, message: String },

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

impl NotesError {
    /// Shorthand for payload validation failures.
    pub fn invalid_note(message: impl Into<String>) -> Self {
        NotesError::InvalidNote {
            message: message.into(),
        }
    }
}

impl From<tokio::task::JoinError> for NotesError {
    fn from(e: tokio::task::JoinError) -> Self {
        NotesError::TaskFailed {
            message: e.to_string(),
        }
    }
}
