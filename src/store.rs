//! In-memory taxonomy store.
//!
//! [`TaxonomyStore::build`] is where raw scraper records become validated
//! [`TaxonomyEntry`] values. The store owns the entries in load order plus
//! the derived lookup material: pre-folded label and hierarchy-path keys for
//! scoring, and a category index for exact browsing. Everything is read-only
//! after construction; rebuilding means building a new store.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{info, warn};

use crate::score::fold;
use crate::types::{MatchError, RawTaxonomyRecord, TaxonomyEntry};

/// Immutable collection of taxonomy entries with derived indices.
#[derive(Debug, Default)]
pub struct TaxonomyStore {
    entries: Vec<TaxonomyEntry>,
    // Case-folded code points, parallel to `entries`. Folding once at build
    // time keeps the per-query scoring loop allocation-free on the entry side.
    label_keys: Vec<Vec<char>>,
    path_keys: Vec<Vec<char>>,
    by_category: HashMap<String, Vec<usize>>,
}

impl TaxonomyStore {
    /// Validate raw records and build the store.
    ///
    /// Fails with [`MatchError::MalformedRecord`] if any record is missing
    /// `industry_id` or a non-empty `label`, or if an id collides with an
    /// earlier record. A missing hierarchy falls back to the label as the
    /// sole segment; `category` and `depth` are always derived from the
    /// normalized hierarchy, never trusted from the wire.
    pub fn build(records: Vec<RawTaxonomyRecord>) -> Result<Self, MatchError> {
        let start = Instant::now();
        let total = records.len();
        match Self::build_inner(records) {
            Ok(store) => {
                info!(
                    entries = store.entries.len(),
                    categories = store.by_category.len(),
                    elapsed_micros = start.elapsed().as_micros() as u64,
                    "store_build_success"
                );
                Ok(store)
            }
            Err(err) => {
                warn!(
                    records = total,
                    error = %err,
                    elapsed_micros = start.elapsed().as_micros() as u64,
                    "store_build_failure"
                );
                Err(err)
            }
        }
    }

    fn build_inner(records: Vec<RawTaxonomyRecord>) -> Result<Self, MatchError> {
        let mut store = TaxonomyStore {
            entries: Vec::with_capacity(records.len()),
            label_keys: Vec::with_capacity(records.len()),
            path_keys: Vec::with_capacity(records.len()),
            by_category: HashMap::new(),
        };
        let mut seen = HashSet::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            let id = record.industry_id.ok_or_else(|| {
                MatchError::MalformedRecord(format!(
                    "record at position {position} is missing industry_id"
                ))
            })?;
            let label = record
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    MatchError::MalformedRecord(format!(
                        "record {id} (position {position}) is missing a label"
                    ))
                })?;
            if !seen.insert(id) {
                return Err(MatchError::MalformedRecord(format!(
                    "duplicate industry_id {id} at position {position}"
                )));
            }

            let mut hierarchy = record
                .hierarchy
                .map(|h| h.into_segments())
                .unwrap_or_default();
            if hierarchy.is_empty() {
                // Top-level rows in the source table carry only a label.
                hierarchy.push(label.clone());
            }
            let category = hierarchy[0].clone();
            let depth = hierarchy.len() - 1;

            let entry = TaxonomyEntry {
                id,
                label,
                hierarchy,
                description: record.description,
                category: category.clone(),
                subcategories: record.subcategories,
                depth,
            };

            let index = store.entries.len();
            store.label_keys.push(fold(&entry.label));
            store.path_keys.push(fold(&entry.hierarchy_path()));
            store.by_category.entry(category).or_default().push(index);
            store.entries.push(entry);
        }

        Ok(store)
    }

    /// All entries in load order.
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose category exactly equals `category` (case-sensitive),
    /// in load order. Unknown category yields an empty vec.
    pub fn entries_in_category(&self, category: &str) -> Vec<&TaxonomyEntry> {
        self.by_category
            .get(category)
            .map(|indices| indices.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Distinct categories present in the store, sorted for determinism.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.by_category.keys().cloned().collect();
        categories.sort();
        categories
    }

    pub(crate) fn label_key(&self, index: usize) -> &[char] {
        &self.label_keys[index]
    }

    pub(crate) fn path_key(&self, index: usize) -> &[char] {
        &self.path_keys[index]
    }
}
