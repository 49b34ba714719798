//! Fuzzy lookup over an industry-classification taxonomy.
//!
//! Given a free-text query, find the closest taxonomy entries ranked by
//! Levenshtein similarity, for one query or a concurrent batch.
//!
//! ## What this crate does
//!
//! - **Load once, query forever** - A [`TaxonomySource`] produces raw
//!   records (CDN fetch with local fallback, a file, or in-memory data);
//!   [`IndustryMatcher::create`] validates them into an immutable store.
//! - **Score everything** - Each lookup computes a case-insensitive,
//!   code-point Levenshtein distance from the query to every entry's label
//!   or hierarchy path and normalizes it into a [0, 1] similarity.
//! - **Rank deterministically** - Results come back similarity-descending
//!   with ascending-id tie-breaks, truncated to `top_n`.
//! - **Batch without starving** - Batches fan out to the blocking pool
//!   under a concurrency cap, results land by input index, and one failing
//!   query never takes down its siblings.
//! - **Log everything** - Structured events via `tracing` on loads, store
//!   builds, and lookup failures.
//!
//! ## Example
//!
//! ```
//! use industry_match::{IndustryMatcher, RawTaxonomyRecord, SearchField};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), industry_match::MatchError> {
//! let matcher = IndustryMatcher::new(vec![
//!     RawTaxonomyRecord::new(1, "Software Development", "Technology > Software Development"),
//!     RawTaxonomyRecord::new(3, "Food Service", "Hospitality > Food Service"),
//! ])?;
//!
//! let results = matcher.find_closest("software", 1, SearchField::Label).await?;
//! assert_eq!(results[0].entry.label, "Software Development");
//! # Ok(())
//! # }
//! ```
//!
//! For one-off lookups against the published dataset, the convenience
//! functions [`get_closest_category`] and [`get_closest_categories_batch`]
//! share a single process-wide matcher that is loaded on first use.

use std::sync::Arc;

pub mod config;
pub mod engine;
pub mod loader;
pub mod metrics;
pub mod rank;
pub mod score;
pub mod store;
pub mod types;

pub use crate::config::{MatcherConfig, DEFAULT_DATA_URL};
pub use crate::engine::IndustryMatcher;
pub use crate::loader::{CdnSource, FileSource, StaticSource, TaxonomySource};
pub use crate::metrics::{set_lookup_metrics, LookupMetrics};
pub use crate::rank::rank;
pub use crate::score::{levenshtein, score};
pub use crate::store::TaxonomyStore;
pub use crate::types::{
    MatchError, MatchResult, RawHierarchy, RawTaxonomyRecord, SearchField, TaxonomyDocument,
    TaxonomyEntry, HIERARCHY_DELIMITER,
};

/// Guarded once-initialized matcher holder.
///
/// Serializes initialization so that any number of concurrent callers
/// observe exactly one load: the first caller holds the cell lock across
/// its load while the rest queue behind it and then share the stored
/// handle. A failed initialization leaves the cell empty, so a later call
/// may retry a load that is documented caller-retryable. [`reset`] is the
/// explicit teardown hook; there is no hidden global beyond the one cell
/// backing the convenience functions.
///
/// [`reset`]: MatcherCell::reset
#[derive(Default)]
pub struct MatcherCell {
    slot: tokio::sync::Mutex<Option<Arc<IndustryMatcher>>>,
}

impl MatcherCell {
    pub const fn new() -> Self {
        Self {
            slot: tokio::sync::Mutex::const_new(None),
        }
    }

    /// Return the stored matcher, initializing it from `source` if the cell
    /// is empty. Concurrent callers during initialization await the single
    /// in-flight load.
    pub async fn get_or_init(
        &self,
        source: &dyn TaxonomySource,
        config: &MatcherConfig,
    ) -> Result<Arc<IndustryMatcher>, MatchError> {
        let mut slot = self.slot.lock().await;
        if let Some(matcher) = slot.as_ref() {
            return Ok(Arc::clone(matcher));
        }
        let matcher = Arc::new(IndustryMatcher::create_with_config(source, config.clone()).await?);
        *slot = Some(Arc::clone(&matcher));
        Ok(matcher)
    }

    /// The stored matcher, if initialized.
    pub async fn get(&self) -> Option<Arc<IndustryMatcher>> {
        self.slot.lock().await.clone()
    }

    /// Discard the stored matcher. The next `get_or_init` loads again.
    pub async fn reset(&self) {
        self.slot.lock().await.take();
    }
}

// Backs the process-wide convenience functions.
static SHARED_MATCHER: MatcherCell = MatcherCell::new();

async fn shared_matcher() -> Result<Arc<IndustryMatcher>, MatchError> {
    let config = MatcherConfig::default();
    let source = CdnSource::from_config(&config);
    SHARED_MATCHER.get_or_init(&source, &config).await
}

/// Find the closest matching categories for one query using the shared
/// process-wide matcher, loading the published dataset on first call.
///
/// Initialization failures propagate as [`MatchError::DataUnavailable`];
/// they are never swallowed. For repeated lookups, create an
/// [`IndustryMatcher`] instead.
pub async fn get_closest_category(
    query: &str,
    top_n: usize,
) -> Result<Vec<MatchResult>, MatchError> {
    let matcher = shared_matcher().await?;
    matcher.find_closest(query, top_n, SearchField::Label).await
}

/// Batched counterpart of [`get_closest_category`]: one result slot per
/// query, in input order, processed concurrently on the shared matcher.
pub async fn get_closest_categories_batch(
    queries: &[String],
    top_n: usize,
) -> Result<Vec<Result<Vec<MatchResult>, MatchError>>, MatchError> {
    let matcher = shared_matcher().await?;
    Ok(matcher
        .find_closest_batch(queries, top_n, SearchField::Label)
        .await)
}

/// Tear down the shared matcher so the next convenience call reloads.
/// Intended for tests and long-lived processes that want a fresh dataset.
pub async fn reset_shared_matcher() {
    SHARED_MATCHER.reset().await;
}
