//! Adjacent pair statistics over a token sequence.
//!
//! Shared by the trainer (which needs frequencies) and the converter
//! (which only needs to know which pairs are present).

use std::collections::HashMap;

use crate::types::{Token, TokenFreq, TokenPair};

/// Counts every adjacent pair `(tokens[i], tokens[i + 1])`.
///
/// Pairs that never occur are absent from the map rather than zero-valued.
/// Sequences shorter than two tokens produce an empty map.
///
/// # Time Complexity
///
/// O(N) where N is the length of `tokens`.
///
/// # Example
///
/// ```
/// use bytebpe::{pair_counts, TokenPair};
///
/// let counts = pair_counts(&[1, 2, 3, 1, 2]);
/// assert_eq!(counts[&TokenPair(1, 2)], 2);
/// assert_eq!(counts.len(), 3);
/// ```
pub fn pair_counts(tokens: &[Token]) -> HashMap<TokenPair, TokenFreq> {
    let mut counts = HashMap::new();
    for window in tokens.windows(2) {
        *counts.entry(TokenPair(window[0], window[1])).or_insert(0) += 1;
    }
    counts
}

/// Picks the pair with the highest frequency.
///
/// Ties are broken by the lexicographically smallest pair so that the
/// result never depends on hash map iteration order.
///
/// Returns `None` if `counts` is empty.
pub fn most_frequent_pair(
    counts: &HashMap<TokenPair, TokenFreq>,
) -> Option<(TokenPair, TokenFreq)> {
    counts
        .iter()
        .map(|(&pair, &freq)| (pair, freq))
        // max_by keeps the last maximum, so compare pairs in reverse
        // to make the smallest pair win a frequency tie.
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
}
