//! Application of a single merge rule to a token sequence.

use crate::types::{Token, TokenPair};

/// Replaces every occurrence of `pair` in `tokens` with `new_tok`.
///
/// Matches are found left to right and never overlap: after a replacement
/// the scan resumes past both consumed tokens, so `[a, a, a]` merged on
/// `(a, a)` yields `[new_tok, a]`.
///
/// If `pair` does not occur the output equals the input.
///
/// # Time Complexity
///
/// O(N) where N is the length of `tokens`.
///
/// # Example
///
/// ```
/// use bytebpe::{merge_pair, TokenPair};
///
/// let merged = merge_pair(&[1, 2, 2, 1, 2], TokenPair(1, 2), 256);
/// assert_eq!(merged, vec![256, 2, 256]);
/// ```
pub fn merge_pair(tokens: &[Token], pair: TokenPair, new_tok: Token) -> Vec<Token> {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        if i + 1 < tokens.len() && tokens[i] == pair.0 && tokens[i + 1] == pair.1 {
            merged.push(new_tok);
            i += 2;
        } else {
            merged.push(tokens[i]);
            i += 1;
        }
    }

    merged
}
