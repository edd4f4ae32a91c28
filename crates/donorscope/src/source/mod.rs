//! Donor sources.
//!
//! A donor source performs the single asynchronous fetch of a session. It
//! returns raw payloads or a [`SourceError`]; every failure kind (transport,
//! non-success status, unreadable file, unparseable body) means the same thing
//! to the coordinator: the collection is unavailable.

mod file;
mod http;

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::donor::RawDonor;
use crate::error::{Error as CrateError, Result as CrateResult};

pub use file::FileSource;
pub use http::HttpSource;

/// Errors that can occur while fetching donors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Endpoint that was called.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("donor source at {url} returned HTTP {status}")]
    Status {
        /// Endpoint that was called.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A local donor file could not be read.
    #[error("failed to read donor file {path}: {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The payload was not a JSON array of donor objects.
    #[error("failed to parse donor payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// A one-shot supplier of raw donor payloads.
#[async_trait::async_trait]
pub trait DonorSource: Send + Sync {
    /// Short description for logs, e.g. the URL or path.
    fn describe(&self) -> String;

    /// Fetch every donor payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the donors could not be obtained or parsed.
    async fn fetch(&self) -> Result<Vec<RawDonor>>;
}

/// Payloads already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    payloads: Vec<RawDonor>,
}

impl MemorySource {
    /// Wrap a set of payloads.
    #[must_use]
    pub fn new(payloads: Vec<RawDonor>) -> Self {
        Self { payloads }
    }

    /// Parse payloads from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON array of objects.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(parse_payload(text)?))
    }
}

#[async_trait::async_trait]
impl DonorSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} payloads)", self.payloads.len())
    }

    async fn fetch(&self) -> Result<Vec<RawDonor>> {
        Ok(self.payloads.clone())
    }
}

/// Parse a donor payload body.
///
/// The body must be a JSON array. Elements that are not objects are skipped
/// with a warning so one bad entry never hides the rest of the collection.
pub(crate) fn parse_payload(text: &str) -> Result<Vec<RawDonor>> {
    let elements: Vec<Value> = serde_json::from_str(text)?;
    let total = elements.len();
    let payloads: Vec<RawDonor> = elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let raw = RawDonor::from_value(element);
            if raw.is_none() {
                warn!(index, "Skipping donor payload that is not an object");
            }
            raw
        })
        .collect();
    if payloads.len() < total {
        debug!(kept = payloads.len(), total, "Parsed donor payload");
    }
    Ok(payloads)
}

/// Build the source described by the configuration.
///
/// A file takes precedence over a URL when both are set.
///
/// # Errors
///
/// Returns an error if neither is configured or the HTTP client cannot be built.
pub fn from_config(config: &SourceConfig) -> CrateResult<Box<dyn DonorSource>> {
    if let Some(path) = &config.file {
        return Ok(Box::new(FileSource::new(path.clone())));
    }
    match &config.url {
        Some(url) => Ok(Box::new(HttpSource::new(url.clone(), config.timeout())?)),
        None => Err(CrateError::SourceNotConfigured),
    }
}
