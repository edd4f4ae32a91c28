//! Local JSON file donor source.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{parse_payload, DonorSource, Result, SourceError};
use crate::donor::RawDonor;

/// Reads donors from a JSON file holding an array of payloads.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl DonorSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<RawDonor>> {
        debug!(path = %self.path.display(), "Reading donors");
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_payload(&text)
    }
}
