//! Edit-distance similarity scoring.
//!
//! This is the hot path under batch load: every lookup scores the query
//! against every entry key in the store. The distance routine is a two-row
//! dynamic program over Unicode code points, O(|a|·|b|) time and
//! O(min(|a|, |b|)) space, with no allocation beyond the rolling row.

/// Case-fold a string into the code-point sequence used for comparison.
///
/// Folding happens once per string; `str::to_lowercase` handles multi-char
/// Unicode expansions, so both sides of a comparison see the same mapping.
pub(crate) fn fold(s: &str) -> Vec<char> {
    s.to_lowercase().chars().collect()
}

/// Levenshtein distance over pre-folded code-point slices. Insertion,
/// deletion, and substitution each cost 1.
pub(crate) fn distance_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Roll the DP over the shorter side to keep the row small.
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, &lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &sc) in short.iter().enumerate() {
            let substitution = diagonal + usize::from(lc != sc);
            let insertion = row[j] + 1;
            let deletion = row[j + 1] + 1;
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(insertion).min(deletion);
        }
    }
    row[short.len()]
}

/// Similarity derived from a distance and the folded operand lengths:
/// `1 - distance / max(len_a, len_b)`, clamped to [0, 1]. Two empty
/// strings are defined as identical.
pub(crate) fn similarity(distance: usize, len_a: usize, len_b: usize) -> f64 {
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Case-insensitive Levenshtein distance between two strings, counted in
/// code points.
pub fn levenshtein(a: &str, b: &str) -> usize {
    distance_chars(&fold(a), &fold(b))
}

/// Score two strings: case-insensitive edit distance plus normalized
/// similarity in [0, 1]. Pure and deterministic.
pub fn score(a: &str, b: &str) -> (usize, f64) {
    let fa = fold(a);
    let fb = fold(b);
    let distance = distance_chars(&fa, &fb);
    (distance, similarity(distance, fa.len(), fb.len()))
}
