use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::MatchError;

/// Default CDN location of the published taxonomy document (jsDelivr mirror
/// of the scraper's output repository).
pub const DEFAULT_DATA_URL: &str =
    "https://cdn.jsdelivr.net/gh/trysignalbase/industry-codes@main/industry_codes.json";

/// Engine configuration.
///
/// Cheap to clone and serde-friendly so it can be embedded in higher-level
/// service configs. All fields have working defaults; `MatcherConfig::default()`
/// is always valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherConfig {
    /// URL the default loader fetches the taxonomy document from.
    #[serde(default = "MatcherConfig::default_data_url")]
    pub data_url: String,
    /// Optional local JSON file tried when the remote fetch fails.
    #[serde(default)]
    pub local_data_path: Option<PathBuf>,
    /// Upper bound on one load attempt (network or file), in seconds.
    /// Expiry surfaces as [`MatchError::DataUnavailable`].
    #[serde(default = "MatcherConfig::default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    /// Maximum number of batch queries scored concurrently. Bounds worker
    /// fan-out so one large batch cannot monopolize the blocking pool.
    #[serde(default = "MatcherConfig::default_batch_concurrency")]
    pub batch_concurrency: usize,
}

impl MatcherConfig {
    pub(crate) fn default_data_url() -> String {
        DEFAULT_DATA_URL.to_string()
    }

    pub(crate) fn default_load_timeout_secs() -> u64 {
        10
    }

    pub(crate) fn default_batch_concurrency() -> usize {
        8
    }

    /// Load timeout as a [`Duration`].
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// Validate the configuration before use.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.data_url.trim().is_empty() {
            return Err(MatchError::InvalidArgument(
                "data_url must not be empty".into(),
            ));
        }
        if self.load_timeout_secs == 0 {
            return Err(MatchError::InvalidArgument(
                "load_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(MatchError::InvalidArgument(
                "batch_concurrency must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            data_url: Self::default_data_url(),
            local_data_path: None,
            load_timeout_secs: Self::default_load_timeout_secs(),
            batch_concurrency: Self::default_batch_concurrency(),
        }
    }
}
