//! BPE Converter - token encoding and decoding using learned merge rules.
//!
//! Holds the frozen merge table and vocabulary produced by training.
//! Encoding repeatedly applies the earliest-learned merge present in the
//! sequence, since later merges were learned on text where the earlier
//! ones had already been applied.

use std::collections::HashMap;

use crate::{
    error::{DecodeError, TokenizerInitError},
    merge::merge_pair,
    stats::pair_counts,
    types::{BASE_VOCAB_SIZE, ByteSeq, MergeRule, Token, TokenPair},
};

/// BPE converter that applies learned merge rules to token sequences.
///
/// Read-only after construction, so a single converter can serve any
/// number of concurrent encode/decode calls.
///
/// # Example
///
/// ```ignore
/// let converter = BPEConverter::from_merges(vec![((97, 98), 256), ((256, 99), 257)])?;
/// let encoded = converter.encode(vec![97, 98, 99]);
/// assert_eq!(encoded, vec![257]);
/// ```
#[derive(Debug, Clone)]
pub(crate) struct BPEConverter {
    /// Maps token pairs to the token they merge into.
    ///
    /// Merged token IDs increase with creation order, so the token
    /// doubles as the merge priority (lower = learned earlier).
    merges: HashMap<TokenPair, Token>,

    /// Maps token IDs to their byte sequences.
    ///
    /// - vocab[0..256]: Base vocabulary (single bytes)
    /// - vocab[256..]: Merged tokens (concatenated byte sequences)
    vocab: Vec<ByteSeq>,
}

impl BPEConverter {
    /// Creates a converter from the output of a finished training run.
    ///
    /// The trainer guarantees that `merge_history` and `vocab` agree, so no
    /// validation is done here.
    pub(crate) fn new(merge_history: Vec<MergeRule>, vocab: Vec<ByteSeq>) -> Self {
        Self {
            merges: merge_history.into_iter().collect(),
            vocab,
        }
    }

    /// Creates a converter from an in-memory merge history, rebuilding the
    /// vocabulary from it.
    ///
    /// # Arguments
    ///
    /// * `merge_history` - Merge rules as `((left_token, right_token), merged_token)`,
    ///   in the order they were learned.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizerInitError`] if merged tokens are not consecutive
    /// from 256, if a merge references a token that does not exist yet, or if
    /// a pair is merged twice.
    pub(crate) fn from_merges(
        merge_history: impl IntoIterator<Item = ((Token, Token), Token)>,
    ) -> Result<Self, TokenizerInitError> {
        let mut merges = HashMap::new();
        // initialize base vocabulary (0-255 → single bytes).
        let mut vocab: Vec<ByteSeq> = (0..BASE_VOCAB_SIZE).map(|b| vec![b as u8]).collect();

        for (order, (pair, tok)) in merge_history.into_iter().enumerate() {
            let pair = TokenPair::from(pair);

            let expected = BASE_VOCAB_SIZE + order;
            if tok != expected {
                return Err(TokenizerInitError::NonConsecutiveToken {
                    order,
                    expected,
                    found: tok,
                });
            }

            // build vocabulary entry for merged token by concatenating
            // constituent byte sequences; both must already exist
            let mut merged_bytes = Vec::new();
            for side in [pair.0, pair.1] {
                let Some(bytes) = vocab.get(side) else {
                    return Err(TokenizerInitError::DanglingToken { pair, token: side });
                };
                merged_bytes.extend_from_slice(bytes);
            }

            if merges.insert(pair, tok).is_some() {
                return Err(TokenizerInitError::DuplicatePair(pair));
            }
            vocab.push(merged_bytes);
        }

        Ok(Self { merges, vocab })
    }

    /// Encodes a token sequence by applying learned BPE merge rules.
    ///
    /// Each round collects the pairs present in the sequence and merges every
    /// occurrence of the one learned earliest. Pairs never seen in training
    /// are not candidates, so the loop ends once none of the present pairs
    /// has a rule.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Input sequence of tokens to encode.
    ///
    /// # Returns
    ///
    /// A new token sequence with all applicable merge rules applied.
    /// The output will have the same or fewer tokens than the input.
    ///
    /// # Time Complexity
    ///
    /// O(N * R) where N is the input length and R the number of rounds.
    pub(crate) fn encode(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        while tokens.len() >= 2 {
            let counts = pair_counts(&tokens);

            // lowest merged token = earliest learned merge
            let next_merge = counts
                .keys()
                .filter_map(|pair| self.merges.get(pair).map(|&tok| (*pair, tok)))
                .min_by_key(|&(_, tok)| tok);

            let Some((pair, merged_tok)) = next_merge else {
                break;
            };

            tokens = merge_pair(&tokens, pair, merged_tok);
        }

        tokens
    }

    /// Decodes a token sequence back into bytes.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Sequence of token IDs to decode.
    ///
    /// # Returns
    ///
    /// The concatenated byte sequence representing the decoded tokens.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownToken`] for the first token ID that is
    /// not in the vocabulary.
    pub(crate) fn decode(&self, tokens: &[Token]) -> Result<ByteSeq, DecodeError> {
        let mut result = Vec::new();
        for &token in tokens {
            let Some(bytes) = self.vocab.get(token) else {
                return Err(DecodeError::UnknownToken(token));
            };
            result.extend_from_slice(bytes);
        }
        Ok(result)
    }

    /// Returns the total number of merge rules in this converter.
    pub(crate) fn num_merges(&self) -> usize {
        self.merges.len()
    }

    /// Returns a reference to the vocabulary.
    pub(crate) fn vocab(&self) -> &[ByteSeq] {
        &self.vocab
    }

    /// Returns a reference to the merge table.
    pub(crate) fn merges(&self) -> &HashMap<TokenPair, Token> {
        &self.merges
    }

    /// Returns the merge rules in the order they were learned.
    pub(crate) fn merge_history(&self) -> Vec<MergeRule> {
        let mut history: Vec<MergeRule> = self.merges.iter().map(|(&p, &t)| (p, t)).collect();
        history.sort_unstable_by_key(|&(_, tok)| tok);
        history
    }
}
