//! Error types for donorscope.
//!
//! This module defines the crate-wide error type. Failures of the donor
//! source itself are modelled separately by [`crate::source::SourceError`],
//! because the view coordinator absorbs them into an explicit unavailable
//! state instead of propagating them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for donorscope operations.
#[derive(Error, Debug)]
pub enum Error {
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

    /// Neither a URL nor a file was configured for the donor source.
    #[error("no donor source configured: set source.url or source.file, or pass --url/--file")]
    SourceNotConfigured,

    /// The HTTP client for the donor source could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    // === Facet Errors ===
    /// A facet value supplied by the user could not be understood.
    #[error("invalid {facet} '{value}'")]
    InvalidFacet {
        /// Which facet was being parsed.
        facet: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A viewport could not be constructed.
    #[error("invalid viewport: {message}")]
    InvalidViewport {
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to read a file given on the command line.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
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

/// A specialized Result type for donorscope operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid facet error.
    #[must_use]
    pub fn invalid_facet(facet: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidFacet {
            facet,
            value: value.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
