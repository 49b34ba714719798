use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::loader::TaxonomySource;
use crate::metrics::metrics_recorder;
use crate::rank::rank;
use crate::store::TaxonomyStore;
use crate::types::{MatchError, MatchResult, RawTaxonomyRecord, SearchField, TaxonomyEntry};


/// Facade over the taxonomy store for single and batched fuzzy lookups.
///
/// A matcher handle only exists in the ready state: the constructors build
/// the store up front and creation errors abort construction entirely, so
/// every lookup on a live handle has data to work with. The store is
/// immutable and shared, which lets concurrent lookups proceed without
/// locking; refreshing the dataset means creating a new matcher.
#[derive(Debug)]
pub struct IndustryMatcher {
    store: Arc<TaxonomyStore>,
    config: MatcherConfig,
    // Caps how many batch queries occupy blocking-pool workers at once.
    batch_permits: Arc<Semaphore>,
}

impl IndustryMatcher {
    /// Build a matcher from already-loaded raw records with the default
    /// configuration.
    pub fn new(records: Vec<RawTaxonomyRecord>) -> Result<Self, MatchError> {
        Self::with_config(records, MatcherConfig::default())
    }

    /// Build a matcher from already-loaded raw records.
    pub fn with_config(
        records: Vec<RawTaxonomyRecord>,
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let store = Arc::new(TaxonomyStore::build(records)?);
        let batch_permits = Arc::new(Semaphore::new(config.batch_concurrency));
        Ok(Self {
            store,
            config,
            batch_permits,
        })
    }

    /// Create a matcher by loading records from `source` with the default
    /// configuration.
    pub async fn create(source: &dyn TaxonomySource) -> Result<Self, MatchError> {
        Self::create_with_config(source, MatcherConfig::default()).await
    }

    /// Create a matcher by loading records from `source`.
    ///
    /// The load is bounded by `config.load_timeout()`; expiry surfaces as
    /// [`MatchError::DataUnavailable`]. The load runs exactly once here and
    /// is never retried internally.
    pub async fn create_with_config(
        source: &dyn TaxonomySource,
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let start = Instant::now();
        let records = tokio::time::timeout(config.load_timeout(), source.load())
            .await
            .map_err(|_| {
                MatchError::DataUnavailable(format!(
                    "taxonomy load timed out after {}s",
                    config.load_timeout_secs
                ))
            })??;
        let matcher = Self::with_config(records, config)?;
        info!(
            entries = matcher.store.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "matcher_ready"
        );
        Ok(matcher)
    }

    /// Find the `top_n` entries closest to `query` on the selected field.
    ///
    /// Scoring every entry is CPU-bound, so it runs on the blocking pool;
    /// concurrent callers sharing one matcher are not starved by a heavy
    /// query.
    pub async fn find_closest(
        &self,
        query: &str,
        top_n: usize,
        search_field: SearchField,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let start = Instant::now();
        let store = Arc::clone(&self.store);
        let query = query.to_string();
        let result = tokio::task::spawn_blocking(move || rank(&store, &query, top_n, search_field))
            .await
            .unwrap_or_else(|e| Err(MatchError::Worker(e.to_string())));

        match &result {
            Ok(hits) => {
                if let Some(recorder) = metrics_recorder() {
                    recorder.record_lookup(search_field, start.elapsed(), hits.len());
                }
            }
            Err(err) => warn!(error = %err, "lookup_failure"),
        }
        result
    }

    /// Find closest matches for many queries concurrently.
    ///
    /// Queries fan out to the blocking pool, at most
    /// `config.batch_concurrency` in flight at a time. The returned vec is
    /// indexed by input position regardless of completion order, and each
    /// slot carries its own outcome: one failing query never aborts its
    /// siblings. Dropping the returned future aborts tasks that have not
    /// started scoring yet.
    pub async fn find_closest_batch(
        &self,
        queries: &[String],
        top_n: usize,
        search_field: SearchField,
    ) -> Vec<Result<Vec<MatchResult>, MatchError>> {
        let mut slots: Vec<Option<Result<Vec<MatchResult>, MatchError>>> =
            (0..queries.len()).map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (index, query) in queries.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let permits = Arc::clone(&self.batch_permits);
            let query = query.clone();
            tasks.spawn(async move {
                // The semaphore is never closed while the matcher lives.
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("batch semaphore closed");
                let start = Instant::now();
                let outcome =
                    tokio::task::spawn_blocking(move || rank(&store, &query, top_n, search_field))
                        .await
                        .unwrap_or_else(|e| Err(MatchError::Worker(e.to_string())));
                if let Ok(hits) = &outcome {
                    if let Some(recorder) = metrics_recorder() {
                        recorder.record_lookup(search_field, start.elapsed(), hits.len());
                    }
                }
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(err) => warn!(error = %err, "batch_worker_failure"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(MatchError::Worker("task did not complete".into()))
                })
            })
            .collect()
    }

    /// All entries whose category exactly equals `category` (case-sensitive),
    /// in load order. Unknown category yields an empty vec, not an error.
    pub fn find_by_category(&self, category: &str) -> Vec<TaxonomyEntry> {
        self.store
            .entries_in_category(category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Distinct top-level categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.store.categories()
    }

    /// The underlying read-only store.
    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
