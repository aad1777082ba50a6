//! Core BPE training loop.
//!
//! Each merge step recounts adjacent pairs over the current token sequence,
//! merges the most frequent pair into a fresh token and records the rule.
//! Steps depend on the previous step's merge, so the loop is sequential.
//!
//! Time complexity: O(N) per merge step, O(N * M) for M merges.

use indicatif::ProgressBar;
use log::{debug, info};

use crate::{
    converter::BPEConverter,
    merge::merge_pair,
    stats::{most_frequent_pair, pair_counts},
    types::{BASE_VOCAB_SIZE, ByteSeq, MergeRule, Token},
};

/// BPE training structure.
///
/// Owns the working token sequence plus the merge history and vocabulary
/// being built. The history and vocabulary only ever grow; once training
/// is done they are frozen into a [`BPEConverter`].
#[derive(Debug)]
pub(crate) struct BPETrainer {
    /// Current token sequence. Shrinks with every applied merge.
    tokens: Vec<Token>,

    /// Next available merge token ID.
    next_tok: Token,

    /// History of merges in creation order.
    merge_history: Vec<MergeRule>,

    /// Token ID -> byte sequence, indexed by token.
    vocab: Vec<ByteSeq>,

    /// Report each merge at `info` level instead of `debug`.
    verbose: bool,
}

impl BPETrainer {
    /// Creates a new BPE trainer from raw training bytes.
    ///
    /// # Arguments
    /// * `bytes` - Training text as UTF-8 bytes; each byte becomes one token.
    /// * `verbose` - Whether merge events are logged at `info` level.
    ///
    /// # Example
    /// ```ignore
    /// let mut trainer = BPETrainer::new("aaabdaaabac".as_bytes(), false);
    /// ```
    pub(crate) fn new(bytes: &[u8], verbose: bool) -> Self {
        let vocab = (0..BASE_VOCAB_SIZE).map(|b| vec![b as u8]).collect();

        BPETrainer {
            tokens: bytes.iter().map(|&b| b as Token).collect(),
            next_tok: BASE_VOCAB_SIZE,
            merge_history: Vec::new(),
            vocab,
            verbose,
        }
    }

    /// Perform one merge operation.
    ///
    /// Returns the learned rule, or `None` if no adjacent pair remains.
    pub(crate) fn merge_step(&mut self) -> Option<MergeRule> {
        let counts = pair_counts(&self.tokens);
        let (max_pair, freq) = most_frequent_pair(&counts)?;

        let new_tok_id = self.next_tok;
        self.next_tok += 1;

        self.tokens = merge_pair(&self.tokens, max_pair, new_tok_id);

        // Both halves are in the vocab: they were read off the sequence,
        // which only holds base bytes and previously learned tokens.
        let mut merged_bytes = Vec::new();
        if let Some(left_bytes) = self.vocab.get(max_pair.0) {
            merged_bytes.extend_from_slice(left_bytes);
        }
        if let Some(right_bytes) = self.vocab.get(max_pair.1) {
            merged_bytes.extend_from_slice(right_bytes);
        }
        self.vocab.push(merged_bytes);

        self.merge_history.push((max_pair, new_tok_id));

        let step = new_tok_id - BASE_VOCAB_SIZE;
        if self.verbose {
            info!(
                "Merge step {step}: merging pair ({}, {}) with new id {new_tok_id} (freq {freq})",
                max_pair.0, max_pair.1
            );
        } else {
            debug!(
                "Merge step {step}: merging pair ({}, {}) with new id {new_tok_id} (freq {freq})",
                max_pair.0, max_pair.1
            );
        }

        Some((max_pair, new_tok_id))
    }

    /// Train BPE with up to M merges.
    ///
    /// Stops early, without error, once the sequence has no pairs left.
    ///
    /// # Arguments
    /// * `num_merges` - Maximum number of merge operations to perform.
    /// * `pb` - Progress bar advanced once per applied merge.
    ///
    /// # Returns
    ///
    /// The number of merges actually applied.
    pub(crate) fn train(&mut self, num_merges: usize, pb: &ProgressBar) -> usize {
        for i in 0..num_merges {
            if self.merge_step().is_none() {
                debug!("No more pairs to merge after {i} merges");
                return i;
            }
            pb.inc(1);
        }
        num_merges
    }

    /// Returns the current token sequence.
    pub(crate) fn get_encodings(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the vocabulary built so far.
    pub(crate) fn vocab(&self) -> &[ByteSeq] {
        &self.vocab
    }

    /// Freezes the learned merges and vocabulary into a converter.
    pub(crate) fn into_converter(self) -> BPEConverter {
        BPEConverter::new(self.merge_history, self.vocab)
    }
}
