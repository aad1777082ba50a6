//! Type aliases and shared types for BPE training and encoding.
//!
//! These type aliases provide semantic clarity throughout the codebase.

/// Represents a token identifier in the vocabulary.
///
/// Token IDs are assigned sequentially, starting from 0 for base tokens (bytes 0-255)
/// and incrementing for each learned merge operation.
pub type Token = usize;

/// Frequency count for token pairs during training.
///
/// Tracks how many times a token pair appears in the current sequence.
pub type TokenFreq = usize;

/// A sequence of raw bytes.
///
/// Used for vocabulary entries and for text before tokenization.
pub type ByteSeq = Vec<u8>;

/// A learned merge: the pair that was merged and the token it produced.
pub type MergeRule = (TokenPair, Token);

/// Number of base tokens, one per possible byte value.
pub const BASE_VOCAB_SIZE: usize = 256;

/// A pair of adjacent tokens.
///
/// Used as a key for looking up merge rules during encoding and for
/// tracking pair frequencies during training.
///
/// Pairs order lexicographically (left id, then right id). Training uses
/// this ordering to pick between pairs of equal frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPair(pub Token, pub Token);

impl From<(Token, Token)> for TokenPair {
    fn from((left, right): (Token, Token)) -> Self {
        TokenPair(left, right)
    }
}

impl From<TokenPair> for (Token, Token) {
    fn from(pair: TokenPair) -> Self {
        (pair.0, pair.1)
    }
}
