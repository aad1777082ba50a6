//! This module provides the public tokenizer pipeline:
//! 1. Training: learn merge rules and a vocabulary from raw text.
//! 2. Encoding: UTF-8 bytes → BPE merges applied in learned order.
//! 3. Decoding: tokens → bytes → text, with configurable UTF-8 handling.
//!
//! Encoding and decoding support parallel batch processing via Rayon.
//! The learned tables are never mutated after training, so batch workers
//! share them without locking.

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::{
    converter::BPEConverter,
    error::{DecodeError, EncodeError, ErrorMode, TokenizerInitError, TrainError},
    progress::progress_bar,
    trainer::BPETrainer,
    types::{BASE_VOCAB_SIZE, ByteSeq, MergeRule, Token, TokenPair},
};

/// Byte-level BPE tokenizer.
///
/// Starts out untrained. [`BasicTokenizer::train`] learns the merge table and
/// vocabulary, after which [`BasicTokenizer::encode`] and
/// [`BasicTokenizer::decode`] can be used. Text is never pre-split and no
/// special tokens are injected: the whole input is one byte stream.
///
/// # Example
///
/// ```
/// use bytebpe::BasicTokenizer;
///
/// let mut tokenizer = BasicTokenizer::new();
/// tokenizer.train("aaabdaaabac", 256 + 3, false)?;
///
/// let tokens = tokenizer.encode("aaabdaaabac")?;
/// assert_eq!(tokens, vec![258, 100, 258, 97, 99]);
/// assert_eq!(tokenizer.decode(&tokens)?, "aaabdaaabac");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BasicTokenizer {
    /// Learned tables; `None` until trained.
    converter: Option<BPEConverter>,
}

impl BasicTokenizer {
    /// Creates an untrained tokenizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trained tokenizer from a merge history.
    ///
    /// # Arguments
    ///
    /// * `merge_history` - BPE merge rules as ((left, right), merged_token).
    ///   Order determines merge priority (earlier = higher priority).
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizerInitError`] if the history does not describe a
    /// valid merge table (non-consecutive ids, unknown tokens, repeated pairs).
    pub fn from_merges(
        merge_history: impl IntoIterator<Item = ((Token, Token), Token)>,
    ) -> Result<Self, TokenizerInitError> {
        Ok(Self {
            converter: Some(BPEConverter::from_merges(merge_history)?),
        })
    }

    /// Learns merge rules from `text` until the vocabulary holds `vocab_size`
    /// tokens or no adjacent pair is left.
    ///
    /// Stopping short of `vocab_size` is not an error. A successful run
    /// replaces any previously learned tables.
    ///
    /// # Arguments
    ///
    /// * `text` - Training text; its UTF-8 bytes form the initial sequence.
    /// * `vocab_size` - Target vocabulary size, at least 256.
    /// * `verbose` - Show a progress bar and log every merge at `info` level.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::VocabSizeTooSmall`] before doing any work if
    /// `vocab_size` is below 256, or [`TrainError::ProgressBarSetup`] if the
    /// progress bar template fails to compile.
    pub fn train(&mut self, text: &str, vocab_size: usize, verbose: bool) -> Result<(), TrainError> {
        if vocab_size < BASE_VOCAB_SIZE {
            return Err(TrainError::VocabSizeTooSmall(vocab_size));
        }
        let num_merges = vocab_size - BASE_VOCAB_SIZE;

        let pb = progress_bar(num_merges as u64, "Training BPE tokenizer", verbose)
            .map_err(TrainError::ProgressBarSetup)?;

        let mut trainer = BPETrainer::new(text.as_bytes(), verbose);
        let applied = trainer.train(num_merges, &pb);
        pb.finish_and_clear();

        log::debug!(
            "Training finished: {applied}/{num_merges} merges, {} bytes -> {} tokens, vocab size {}",
            text.len(),
            trainer.get_encodings().len(),
            trainer.vocab().len()
        );

        self.converter = Some(trainer.into_converter());
        Ok(())
    }

    /// Encodes text as raw UTF-8 bytes → BPE.
    ///
    /// Bytes and pairs never seen in training pass through as their base
    /// byte tokens; encoding never fails on unseen input.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Untrained`] if the tokenizer has not been trained.
    pub fn encode(&self, text: &str) -> Result<Vec<Token>, EncodeError> {
        let converter = self.converter.as_ref().ok_or(EncodeError::Untrained)?;

        // String → UTF-8 bytes → Token integers
        let byte_tokens: Vec<Token> = text.bytes().map(|b| b as Token).collect();
        if byte_tokens.len() <= 1 {
            return Ok(byte_tokens);
        }

        Ok(converter.encode(byte_tokens))
    }

    /// Encode many texts in parallel using Rayon.
    ///
    /// Each text is encoded independently on a Rayon worker.
    ///
    /// # Arguments
    ///
    /// * `texts` - Slice of text strings to encode.
    /// * `show_progress` - Whether to display a progress bar during encoding.
    ///
    /// # Returns
    ///
    /// Vector of token sequences in the same order as input texts.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Untrained`] if the tokenizer has not been trained,
    /// or [`EncodeError::ProgressBarSetup`] if the progress bar template fails
    /// to compile.
    pub fn encode_batch(
        &self,
        texts: &[&str],
        show_progress: bool,
    ) -> Result<Vec<Vec<Token>>, EncodeError> {
        if self.converter.is_none() {
            return Err(EncodeError::Untrained);
        }

        let pb = progress_bar(texts.len() as u64, "Encoding texts", show_progress)
            .map_err(EncodeError::ProgressBarSetup)?;

        texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.encode(text))
            .collect()
    }

    /// Decodes a token sequence back into text, replacing invalid UTF-8
    /// with U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Untrained`] if the tokenizer has not been
    /// trained, or [`DecodeError::UnknownToken`] if a token ID is not in the
    /// vocabulary.
    pub fn decode(&self, tokens: &[Token]) -> Result<String, DecodeError> {
        self.decode_with(tokens, ErrorMode::Replace)
    }

    /// Decodes a token sequence back into text with the given UTF-8 policy.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Sequence of token IDs to decode.
    /// * `errors` - How to handle invalid UTF-8 in decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Untrained`] if the tokenizer has not been trained,
    /// [`DecodeError::UnknownToken`] if a token ID is not found in the
    /// vocabulary, or [`DecodeError::InvalidUtf8`] if the decoded bytes are not
    /// valid UTF-8 (only in `Strict` mode).
    pub fn decode_with(&self, tokens: &[Token], errors: ErrorMode) -> Result<String, DecodeError> {
        let converter = self.converter.as_ref().ok_or(DecodeError::Untrained)?;
        let bytes = converter.decode(tokens)?;

        match errors {
            ErrorMode::Strict => String::from_utf8(bytes).map_err(DecodeError::InvalidUtf8),
            ErrorMode::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Decodes multiple token sequences in parallel.
    ///
    /// Each token sequence is independently decoded on a Rayon worker.
    ///
    /// # Arguments
    ///
    /// * `token_seqs` - Slice of token sequences to decode.
    /// * `errors` - How to handle invalid UTF-8 in decoded bytes.
    /// * `show_progress` - Whether to display a progress bar during decoding.
    ///
    /// # Returns
    ///
    /// Decoded strings in the same order as input.
    ///
    /// # Errors
    ///
    /// Same as [`BasicTokenizer::decode_with`], plus
    /// [`DecodeError::ProgressBarSetup`] if the progress bar template fails to
    /// compile.
    pub fn decode_batch(
        &self,
        token_seqs: &[&[Token]],
        errors: ErrorMode,
        show_progress: bool,
    ) -> Result<Vec<String>, DecodeError> {
        if self.converter.is_none() {
            return Err(DecodeError::Untrained);
        }

        let pb = progress_bar(token_seqs.len() as u64, "Decoding tokens", show_progress)
            .map_err(DecodeError::ProgressBarSetup)?;

        token_seqs
            .par_iter()
            .progress_with(pb)
            .map(|tokens| self.decode_with(tokens, errors))
            .collect()
    }

    /// Returns whether merge rules have been learned or loaded.
    pub fn is_trained(&self) -> bool {
        self.converter.is_some()
    }

    /// Returns the vocabulary size (number of tokens), or 0 if untrained.
    pub fn vocab_size(&self) -> usize {
        self.converter.as_ref().map_or(0, |c| c.vocab().len())
    }

    /// Returns the number of learned merges, or 0 if untrained.
    pub fn num_merges(&self) -> usize {
        self.converter.as_ref().map_or(0, BPEConverter::num_merges)
    }

    /// Returns the vocabulary indexed by token ID.
    pub fn vocab(&self) -> Option<&[ByteSeq]> {
        self.converter.as_ref().map(BPEConverter::vocab)
    }

    /// Returns the token a pair merges into, if such a rule was learned.
    pub fn merge_for(&self, left: Token, right: Token) -> Option<Token> {
        self.converter
            .as_ref()
            .and_then(|c| c.merges().get(&TokenPair(left, right)).copied())
    }

    /// Returns the learned merges in the order they were learned.
    pub fn merge_history(&self) -> Vec<MergeRule> {
        self.converter
            .as_ref()
            .map(BPEConverter::merge_history)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "aaabdaaabac";

    fn trained(text: &str, vocab_size: usize) -> BasicTokenizer {
        let mut tok = BasicTokenizer::new();
        tok.train(text, vocab_size, false)
            .expect("training should succeed");
        tok
    }

    #[test]
    fn test_train_learns_most_frequent_pair_first() {
        let tok = trained(SAMPLE, 256 + 3);
        assert_eq!(tok.vocab_size(), 259);
        assert_eq!(
            tok.merge_history(),
            vec![
                (TokenPair(97, 97), 256),
                (TokenPair(97, 98), 257),
                (TokenPair(256, 257), 258),
            ]
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let tok = trained(SAMPLE, 256 + 3);
        let encoded = tok.encode(SAMPLE).expect("text should be encodable");
        assert_eq!(encoded, vec![258, 100, 258, 97, 99]);
        let decoded = tok.decode(&encoded).expect("tokens should be decodable");
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_round_trip_multibyte_text() {
        let text = "héllo wörld, こんにちは こんにちは 👋👋 hello";
        for vocab_size in [256, 260, 300, 1000] {
            let tok = trained(text, vocab_size);
            let encoded = tok.encode(text).expect("text should be encodable");
            let decoded = tok
                .decode_with(&encoded, ErrorMode::Strict)
                .expect("tokens should be decodable");
            assert_eq!(decoded, text);
        }
    }

    #[test]
    fn test_round_trip_on_unseen_text() {
        let tok = trained("the cat sat on the mat", 280);
        let text = "a hat for the rat 🐀";
        let encoded = tok.encode(text).expect("text should be encodable");
        assert_eq!(tok.decode(&encoded).expect("decodable"), text);
    }

    #[test]
    fn test_vocab_size_too_small() {
        let mut tok = BasicTokenizer::new();
        let result = tok.train(SAMPLE, 100, false);
        assert!(matches!(result, Err(TrainError::VocabSizeTooSmall(100))));
        assert!(!tok.is_trained());
    }

    #[test]
    fn test_failed_training_keeps_previous_tables() {
        let mut tok = trained(SAMPLE, 258);
        assert!(tok.train(SAMPLE, 255, false).is_err());
        assert_eq!(tok.vocab_size(), 258);
    }

    #[test]
    fn test_vocab_size_256_means_no_merges() {
        let tok = trained(SAMPLE, 256);
        assert_eq!(tok.num_merges(), 0);
        let encoded = tok.encode("ab").expect("text should be encodable");
        assert_eq!(encoded, vec![97, 98]);
    }

    #[test]
    fn test_training_is_deterministic() {
        let text = "to be or not to be, that is the question";
        let first = trained(text, 300);
        let second = trained(text, 300);
        assert_eq!(first.merge_history(), second.merge_history());
        assert_eq!(first.vocab(), second.vocab());
    }

    #[test]
    fn test_early_termination_id_range() {
        // "abcab" collapses to one token after three merges.
        let tok = trained("abcab", 1000);
        let history = tok.merge_history();
        assert!(history.len() < 1000 - 256);
        assert_eq!(tok.vocab_size(), 256 + history.len());
        for (i, (_, t)) in history.iter().enumerate() {
            assert_eq!(*t, 256 + i);
        }
    }

    #[test]
    fn test_id_range_invariant() {
        let tok = trained("mississippi river banks mississippi", 270);
        let n = tok.num_merges();
        assert_eq!(tok.vocab_size(), 256 + n);
        for (pair, t) in tok.merge_history() {
            assert!((256..256 + n).contains(&t));
            assert!(pair.0 < t && pair.1 < t);
        }
    }

    #[test]
    fn test_unseen_bytes_pass_through() {
        let tok = trained("aaaa", 260);
        let encoded = tok.encode("zz\u{7f}").expect("text should be encodable");
        assert_eq!(encoded, vec![122, 122, 127]);
    }

    #[test]
    fn test_encoding_respects_merge_order() {
        // "bc" was learned before "ab", so "abc" must become [a, bc].
        let tok = BasicTokenizer::from_merges(vec![((98, 99), 256), ((97, 98), 257)])
            .expect("valid merges");
        let encoded = tok.encode("abc").expect("text should be encodable");
        assert_eq!(encoded, vec![97, 256]);
    }

    #[test]
    fn test_empty_and_single_byte_input() {
        let tok = trained(SAMPLE, 259);
        assert_eq!(tok.encode("").expect("encodable"), Vec::<Token>::new());
        assert_eq!(tok.encode("a").expect("encodable"), vec![97]);
        assert_eq!(tok.decode(&[]).expect("decodable"), "");
    }

    #[test]
    fn test_untrained_errors() {
        let tok = BasicTokenizer::new();
        assert!(matches!(tok.encode("abc"), Err(EncodeError::Untrained)));
        assert!(matches!(tok.decode(&[97]), Err(DecodeError::Untrained)));
        assert!(matches!(
            tok.encode_batch(&["abc"], false),
            Err(EncodeError::Untrained)
        ));
        assert_eq!(tok.vocab_size(), 0);
        assert!(tok.merge_history().is_empty());
    }

    #[test]
    fn test_decode_unknown_token_errors() {
        let tok = trained(SAMPLE, 259);
        let result = tok.decode(&[999]);
        assert!(matches!(result, Err(DecodeError::UnknownToken(999))));
    }

    #[test]
    fn test_decode_invalid_utf8_replace_vs_strict() {
        let tok = trained(SAMPLE, 259);
        // 0xC3 starts a two-byte sequence but 0x28 is not a continuation byte.
        let tokens = [0xC3, 0x28];
        let decoded = tok.decode(&tokens).expect("replace mode never fails on bytes");
        assert_eq!(decoded, "\u{FFFD}(");
        assert!(matches!(
            tok.decode_with(&tokens, ErrorMode::Strict),
            Err(DecodeError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn test_encode_batch_parallel() {
        let tok = trained(SAMPLE, 259);
        let results = tok
            .encode_batch(&["aaab", "cd", SAMPLE], false)
            .expect("texts should be batch-encodable");
        assert_eq!(
            results,
            vec![vec![258], vec![99, 100], vec![258, 100, 258, 97, 99]]
        );
    }

    #[test]
    fn test_decode_batch() {
        let tok = trained(SAMPLE, 259);
        let seq1 = vec![258];
        let seq2 = vec![99, 100];
        let token_seqs: Vec<&[Token]> = vec![&seq1, &seq2];
        let decoded = tok
            .decode_batch(&token_seqs, ErrorMode::Strict, false)
            .expect("token sequences should be batch-decodable");
        assert_eq!(decoded, vec!["aaab", "cd"]);
    }

    #[test]
    fn test_decode_batch_unknown_token() {
        let tok = trained(SAMPLE, 259);
        let bad = vec![97, 5000];
        let token_seqs: Vec<&[Token]> = vec![&bad];
        assert!(matches!(
            tok.decode_batch(&token_seqs, ErrorMode::Replace, false),
            Err(DecodeError::UnknownToken(5000))
        ));
    }

    #[test]
    fn test_from_merges_matches_training() {
        let trained_tok = trained(SAMPLE, 259);
        let history: Vec<((Token, Token), Token)> = trained_tok
            .merge_history()
            .into_iter()
            .map(|(pair, t)| (pair.into(), t))
            .collect();
        let loaded = BasicTokenizer::from_merges(history).expect("valid merges");
        assert_eq!(loaded.vocab(), trained_tok.vocab());
        assert_eq!(
            loaded.encode(SAMPLE).expect("encodable"),
            trained_tok.encode(SAMPLE).expect("encodable")
        );
        assert_eq!(loaded.merge_for(97, 97), Some(256));
        assert_eq!(loaded.merge_for(98, 97), None);
    }
}
