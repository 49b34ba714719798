//! Taxonomy data acquisition.
//!
//! The engine never fetches data on its own schedule; it asks a
//! [`TaxonomySource`] exactly once per store build and surfaces any failure
//! as [`MatchError::DataUnavailable`]. Retrying is the caller's decision.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::types::{MatchError, RawTaxonomyRecord, TaxonomyDocument};

// Process-wide HTTP client with pooled connections. Built once; per-request
// timeouts override the client default.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

/// Provider of raw taxonomy records.
///
/// Implementations must return the full record sequence or fail with
/// [`MatchError::DataUnavailable`]; partial datasets are not a concept at
/// this layer.
#[async_trait]
pub trait TaxonomySource: Send + Sync {
    async fn load(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError>;
}

/// Fetches the published taxonomy document from a CDN URL, with an optional
/// local-file fallback tried after any remote failure (network error, bad
/// status, parse failure, or timeout).
#[derive(Debug, Clone)]
pub struct CdnSource {
    url: String,
    timeout: Duration,
    fallback_path: Option<PathBuf>,
}

impl CdnSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(MatcherConfig::default_load_timeout_secs()),
            fallback_path: None,
        }
    }

    /// Source described by a [`MatcherConfig`]: its URL, timeout, and
    /// optional local fallback file.
    pub fn from_config(config: &MatcherConfig) -> Self {
        Self {
            url: config.data_url.clone(),
            timeout: config.load_timeout(),
            fallback_path: config.local_data_path.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback_path = Some(path.into());
        self
    }

    async fn fetch_remote(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
        let response = HTTP_CLIENT
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MatchError::DataUnavailable(format!("fetch {} failed: {e}", self.url)))?;
        let document: TaxonomyDocument = response.json().await.map_err(|e| {
            MatchError::DataUnavailable(format!("invalid taxonomy document from {}: {e}", self.url))
        })?;
        Ok(document.industries)
    }
}

#[async_trait]
impl TaxonomySource for CdnSource {
    async fn load(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
        match self.fetch_remote().await {
            Ok(records) => {
                info!(url = %self.url, records = records.len(), "taxonomy_load_remote");
                Ok(records)
            }
            Err(remote_err) => match &self.fallback_path {
                Some(path) => {
                    warn!(url = %self.url, error = %remote_err, fallback = %path.display(),
                        "taxonomy_load_remote_failed_trying_fallback");
                    read_document(path).await.map_err(|file_err| {
                        MatchError::DataUnavailable(format!(
                            "remote load failed ({remote_err}) and fallback failed ({file_err})"
                        ))
                    })
                }
                None => {
                    warn!(url = %self.url, error = %remote_err, "taxonomy_load_remote_failed");
                    Err(remote_err)
                }
            },
        }
    }
}

/// Reads a taxonomy document from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TaxonomySource for FileSource {
    async fn load(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
        let records = read_document(&self.path).await?;
        info!(path = %self.path.display(), records = records.len(), "taxonomy_load_file");
        Ok(records)
    }
}

/// In-memory records, for tests and callers that embed their own dataset.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawTaxonomyRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawTaxonomyRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TaxonomySource for StaticSource {
    async fn load(&self) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
        Ok(self.records.clone())
    }
}

async fn read_document(path: &Path) -> Result<Vec<RawTaxonomyRecord>, MatchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| MatchError::DataUnavailable(format!("read {} failed: {e}", path.display())))?;
    let document: TaxonomyDocument = serde_json::from_slice(&bytes).map_err(|e| {
        MatchError::DataUnavailable(format!("invalid taxonomy document {}: {e}", path.display()))
    })?;
    Ok(document.industries)
}
