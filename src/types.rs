use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter used when flattening a hierarchy path into a single string,
/// matching the upstream dataset's `"Category > Subcategory"` convention.
pub const HIERARCHY_DELIMITER: &str = " > ";

/// Which derived string a lookup scores the query against.
///
/// This is a closed set; callers select a field rather than passing a
/// string key so an unknown field is unrepresentable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    /// Score against the entry's canonical label.
    #[default]
    Label,
    /// Score against the flattened hierarchy path (`"A > B > C"`).
    Hierarchy,
    /// Score against both and keep the better of the two per entry.
    /// On an exact tie the label-field score wins.
    Both,
}

/// Hierarchy as it appears on the wire: either a pre-flattened path string
/// or an explicit sequence of segments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawHierarchy {
    Path(String),
    Segments(Vec<String>),
}

impl RawHierarchy {
    /// Normalize into ordered segments. Empty or whitespace-only segments
    /// are dropped so `""` and `[]` both normalize to an empty vec.
    pub fn into_segments(self) -> Vec<String> {
        match self {
            RawHierarchy::Path(path) => path
                .split(HIERARCHY_DELIMITER)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            RawHierarchy::Segments(segments) => segments
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// One taxonomy record as produced by the upstream scraper, prior to
/// validation. Field names follow the collaborator's JSON schema
/// (`industry_id`, not `id`); unknown fields are tolerated.
///
/// `depth` is accepted but ignored: the store recomputes it from the
/// hierarchy so the invariant `depth == hierarchy.len() - 1` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawTaxonomyRecord {
    #[serde(default)]
    pub industry_id: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub hierarchy: Option<RawHierarchy>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategories: Vec<u32>,
    #[serde(default)]
    pub depth: Option<u32>,
}

impl RawTaxonomyRecord {
    /// Minimal well-formed record, used pervasively in tests.
    pub fn new(id: u32, label: &str, hierarchy: &str) -> Self {
        Self {
            industry_id: Some(id),
            label: Some(label.to_string()),
            hierarchy: Some(RawHierarchy::Path(hierarchy.to_string())),
            ..Self::default()
        }
    }
}

/// The JSON envelope the scraper publishes to the CDN. Only `industries`
/// matters to the engine; the remaining fields are provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaxonomyDocument {
    #[serde(default)]
    pub industries: Vec<RawTaxonomyRecord>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub total_industries: Option<usize>,
}

/// A validated, immutable taxonomy entry.
///
/// Invariants enforced at store build time:
/// - `id` unique within a store
/// - `label` non-empty
/// - `hierarchy` has at least one segment and `category == hierarchy[0]`
/// - `depth == hierarchy.len() - 1`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyEntry {
    /// Stable identifier assigned by the upstream source.
    #[serde(rename = "industry_id")]
    pub id: u32,
    /// Canonical human-readable name.
    pub label: String,
    /// Ordered path from root category to this entry.
    pub hierarchy: Vec<String>,
    /// Free-text description; may be empty.
    #[serde(default)]
    pub description: String,
    /// First hierarchy segment.
    pub category: String,
    /// Identifiers of direct child entries.
    #[serde(default)]
    pub subcategories: Vec<u32>,
    /// Distance from the root category: `hierarchy.len() - 1`.
    pub depth: usize,
}

impl TaxonomyEntry {
    /// Hierarchy flattened with [`HIERARCHY_DELIMITER`].
    pub fn hierarchy_path(&self) -> String {
        self.hierarchy.join(HIERARCHY_DELIMITER)
    }
}

/// One ranked hit for a single query. Ephemeral: produced per ranking call
/// and not persisted. Serializes flat, i.e. the entry fields plus
/// `similarity_score` and `levenshtein_distance` at the top level, matching
/// the collaborator's output schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    #[serde(flatten)]
    pub entry: TaxonomyEntry,
    /// Normalized inverse edit distance in [0, 1]; 1.0 means identical.
    pub similarity_score: f64,
    /// Raw case-insensitive edit distance to the scored field.
    pub levenshtein_distance: usize,
}

/// Errors produced by the matching engine.
///
/// All variants are cloneable and comparable so batch slots can carry them
/// and tests can assert on them precisely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A raw record is missing `industry_id` or `label`, or an id collides
    /// with an earlier record. Aborts store construction; non-retryable,
    /// the upstream data must be fixed.
    #[error("malformed taxonomy record: {0}")]
    MalformedRecord(String),
    /// The external loader could not produce records (network, file, parse,
    /// or timeout failure). Retryable by the caller; never retried here.
    #[error("taxonomy data unavailable: {0}")]
    DataUnavailable(String),
    /// Caller supplied an out-of-range argument. Fails fast.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Ranking was attempted against a store with zero entries.
    #[error("taxonomy store is empty")]
    EmptyStore,
    /// A batch worker did not complete (panic or abort). Only ever appears
    /// as a per-slot marker inside a batch result.
    #[error("lookup worker failed: {0}")]
    Worker(String),
}
