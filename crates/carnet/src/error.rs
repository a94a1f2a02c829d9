//! Error types for carnet.
//!
//! This module defines all error types used throughout the carnet crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for carnet operations.
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

    // === Record Errors ===
    /// No record with the given id exists in storage.
    #[error("no placement record with id {id}")]
    RecordNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A field index was outside its allowed range.
    #[error("{field} {value} is out of range ({min}..={max})")]
    OutOfRange {
        /// Which field was addressed.
        field: &'static str,
        /// The rejected value.
        value: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// A date string could not be parsed.
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// A backup file could not be read as a placement record.
    #[error("failed to import {path}: {message}")]
    Import {
        /// The file that was read.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Rendering Errors ===
    /// An image could not be decoded or encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A photo payload is not a valid inline data URL.
    #[error("invalid encoded image: {0}")]
    EncodedImage(String),

    /// Rasterizing a page failed.
    #[error("failed to rasterize page {page}: {message}")]
    Rasterize {
        /// Index of the page being captured.
        page: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Building or writing the PDF document failed.
    #[error("PDF error: {0}")]
    Pdf(String),

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

/// A specialized Result type for carnet operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new PDF error.
    #[must_use]
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create a rasterization error for the given page.
    #[must_use]
    pub fn rasterize(page: usize, message: impl Into<String>) -> Self {
        Self::Rasterize {
            page,
            message: message.into(),
        }
    }

    /// Create an import error for the given file.
    #[must_use]
    pub fn import(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Import {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an out-of-range error.
    #[must_use]
    pub fn out_of_range(field: &'static str, value: usize, min: usize, max: usize) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// Check if this error means the requested record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }

    /// Check if this error came from reading a backup file.
    #[must_use]
    pub fn is_import_error(&self) -> bool {
        matches!(self, Self::Import { .. })
    }
}
