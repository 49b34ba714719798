//! Query ranking: score every entry, order deterministically, truncate.

use crate::score::{distance_chars, fold, similarity};
use crate::store::TaxonomyStore;
use crate::types::{MatchError, MatchResult, SearchField};

/// Rank every store entry against `query` and return the best `top_n`.
///
/// Scores the field selected by `search_field`; for [`SearchField::Both`]
/// the better of the label and hierarchy-path scores wins per entry, with
/// the label score preferred on an exact tie. Results are ordered by
/// similarity descending, then `id` ascending, so identical inputs always
/// produce identical output sequences. A `top_n` beyond the store size
/// returns every entry; an empty query is valid input.
pub fn rank(
    store: &TaxonomyStore,
    query: &str,
    top_n: usize,
    search_field: SearchField,
) -> Result<Vec<MatchResult>, MatchError> {
    if top_n == 0 {
        return Err(MatchError::InvalidArgument(
            "top_n must be greater than zero".into(),
        ));
    }
    if store.is_empty() {
        return Err(MatchError::EmptyStore);
    }

    let query_key = fold(query);

    struct Scored {
        index: usize,
        id: u32,
        distance: usize,
        similarity: f64,
    }

    let mut scored: Vec<Scored> = Vec::with_capacity(store.len());
    for (index, entry) in store.entries().iter().enumerate() {
        let (distance, score) = match search_field {
            SearchField::Label => score_key(&query_key, store.label_key(index)),
            SearchField::Hierarchy => score_key(&query_key, store.path_key(index)),
            SearchField::Both => {
                let label = score_key(&query_key, store.label_key(index));
                let path = score_key(&query_key, store.path_key(index));
                if path.1 > label.1 {
                    path
                } else {
                    label
                }
            }
        };
        scored.push(Scored {
            index,
            id: entry.id,
            distance,
            similarity: score,
        });
    }

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(top_n);

    Ok(scored
        .into_iter()
        .map(|s| MatchResult {
            entry: store.entries()[s.index].clone(),
            similarity_score: s.similarity,
            levenshtein_distance: s.distance,
        })
        .collect())
}

fn score_key(query: &[char], key: &[char]) -> (usize, f64) {
    let distance = distance_chars(query, key);
    (distance, similarity(distance, query.len(), key.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTaxonomyRecord;

    fn sample_store() -> TaxonomyStore {
        TaxonomyStore::build(vec![
            RawTaxonomyRecord::new(1, "Software Development", "Technology > Software Development"),
            RawTaxonomyRecord::new(2, "Software Engineering", "Technology > Software Engineering"),
            RawTaxonomyRecord::new(3, "Food Service", "Hospitality > Food Service"),
        ])
        .expect("build")
    }

    #[test]
    fn software_query_prefers_software_entries() {
        let store = sample_store();
        let results = rank(&store, "software", 2, SearchField::Label).expect("rank");
        assert_eq!(results.len(), 2);
        // Both labels are distance 12 from "software"; the id tie-break puts
        // entry 1 first, deterministically.
        assert_eq!(results[0].entry.id, 1);
        assert_eq!(results[1].entry.id, 2);
        assert_eq!(results[0].similarity_score, results[1].similarity_score);
    }

    #[test]
    fn identical_inputs_yield_identical_sequences() {
        let store = sample_store();
        let first = rank(&store, "tech", 3, SearchField::Hierarchy).expect("rank");
        let second = rank(&store, "tech", 3, SearchField::Hierarchy).expect("rank");
        assert_eq!(first, second);
    }

    #[test]
    fn scores_are_non_increasing() {
        let store = sample_store();
        let results = rank(&store, "service", 3, SearchField::Label).expect("rank");
        for pair in results.windows(2) {
            assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
    }

    #[test]
    fn exact_label_match_scores_one() {
        let store = sample_store();
        let results = rank(&store, "Food Service", 1, SearchField::Label).expect("rank");
        assert_eq!(results[0].entry.id, 3);
        assert_eq!(results[0].similarity_score, 1.0);
        assert_eq!(results[0].levenshtein_distance, 0);
    }

    #[test]
    fn hierarchy_field_scores_the_flattened_path() {
        let store = sample_store();
        let results = rank(
            &store,
            "technology > software development",
            1,
            SearchField::Hierarchy,
        )
        .expect("rank");
        assert_eq!(results[0].entry.id, 1);
        assert_eq!(results[0].similarity_score, 1.0);
    }

    #[test]
    fn both_field_takes_the_better_score_and_prefers_label_on_tie() {
        let store = sample_store();
        // The full path scores far better than the bare label here.
        let hit = &rank(
            &store,
            "hospitality > food service",
            1,
            SearchField::Both,
        )
        .expect("rank")[0];
        assert_eq!(hit.entry.id, 3);
        assert_eq!(hit.similarity_score, 1.0);

        // A single-segment hierarchy makes label and path keys identical;
        // the reported distance must come from the label side of the tie.
        let store = TaxonomyStore::build(vec![RawTaxonomyRecord::new(1, "Retail", "Retail")])
            .expect("build");
        let label_only = rank(&store, "retail", 1, SearchField::Label).expect("rank");
        let both = rank(&store, "retail", 1, SearchField::Both).expect("rank");
        assert_eq!(label_only, both);
    }

    #[test]
    fn top_n_clamps_to_store_size() {
        let store = sample_store();
        let results = rank(&store, "anything", 1000, SearchField::Label).expect("rank");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn zero_top_n_is_invalid() {
        let store = sample_store();
        let err = rank(&store, "x", 0, SearchField::Label).expect_err("must fail");
        assert!(matches!(err, MatchError::InvalidArgument(_)));
    }

    #[test]
    fn empty_store_is_an_error() {
        let store = TaxonomyStore::build(Vec::new()).expect("build");
        let err = rank(&store, "x", 1, SearchField::Label).expect_err("must fail");
        assert_eq!(err, MatchError::EmptyStore);
    }

    #[test]
    fn empty_query_is_valid_and_scored_by_target_length() {
        let store = sample_store();
        let results = rank(&store, "", 3, SearchField::Label).expect("rank");
        assert_eq!(results.len(), 3);
        // Distance to an empty query is the key length, so every similarity
        // collapses to 0.0 and ordering falls to the id tie-break.
        let ids: Vec<u32> = results.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for r in &results {
            assert_eq!(r.similarity_score, 0.0);
            assert!(r.levenshtein_distance > 0);
        }
    }
}
