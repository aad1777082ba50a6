//! Byte-level BPE (Byte-Pair Encoding) tokenizer core.
//!
//! Learns merge rules from the raw UTF-8 bytes of a training text, encodes
//! new text by applying those merges in the order they were learned, and
//! decodes token IDs back into text.
//!
//! With the `python` feature enabled this crate is also a PyO3 extension module.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![deny(unused_must_use)]

mod converter;
mod error;
mod merge;
mod progress;
mod stats;
mod tokenizer;
mod trainer;
mod types;

pub use error::{DecodeError, EncodeError, ErrorMode, TokenizerInitError, TrainError};
pub use merge::merge_pair;
pub use stats::{most_frequent_pair, pair_counts};
pub use tokenizer::BasicTokenizer;
pub use types::{BASE_VOCAB_SIZE, ByteSeq, MergeRule, Token, TokenFreq, TokenPair};

#[cfg(feature = "python")]
mod python {
    use pyo3::{
        exceptions::{PyKeyError, PyRuntimeError, PyValueError},
        prelude::*,
    };

    use crate::{
        BasicTokenizer, DecodeError, EncodeError, ErrorMode, Token, TokenizerInitError, TrainError,
    };

    impl From<TrainError> for PyErr {
        fn from(e: TrainError) -> Self {
            PyValueError::new_err(e.to_string())
        }
    }

    impl From<EncodeError> for PyErr {
        fn from(e: EncodeError) -> Self {
            PyRuntimeError::new_err(e.to_string())
        }
    }

    impl From<DecodeError> for PyErr {
        fn from(e: DecodeError) -> Self {
            match e {
                DecodeError::UnknownToken(tok) => PyKeyError::new_err(tok),
                DecodeError::InvalidUtf8(_) => PyValueError::new_err(e.to_string()),
                DecodeError::Untrained | DecodeError::ProgressBarSetup(_) => {
                    PyRuntimeError::new_err(e.to_string())
                }
            }
        }
    }

    impl From<TokenizerInitError> for PyErr {
        fn from(e: TokenizerInitError) -> Self {
            PyValueError::new_err(e.to_string())
        }
    }

    fn parse_errors(errors: &str) -> PyResult<ErrorMode> {
        errors.parse().map_err(PyValueError::new_err)
    }

    /// Python wrapper for the BPE tokenizer.
    #[pyclass]
    pub struct RustBasicTokenizer {
        tokenizer: BasicTokenizer,
    }

    #[pymethods]
    impl RustBasicTokenizer {
        #[new]
        #[pyo3(signature = (merge_history=None))]
        fn new(merge_history: Option<Vec<((Token, Token), Token)>>) -> PyResult<Self> {
            let tokenizer = match merge_history {
                Some(history) => BasicTokenizer::from_merges(history)?,
                None => BasicTokenizer::new(),
            };
            Ok(RustBasicTokenizer { tokenizer })
        }

        #[pyo3(signature = (text, vocab_size, verbose=false))]
        fn train(&mut self, text: &str, vocab_size: usize, verbose: bool) -> PyResult<()> {
            Ok(self.tokenizer.train(text, vocab_size, verbose)?)
        }

        fn encode(&self, text: &str) -> PyResult<Vec<Token>> {
            Ok(self.tokenizer.encode(text)?)
        }

        #[pyo3(signature = (texts, show_progress=false))]
        fn encode_batch(&self, texts: Vec<String>, show_progress: bool) -> PyResult<Vec<Vec<Token>>> {
            let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
            Ok(self.tokenizer.encode_batch(&texts, show_progress)?)
        }

        #[pyo3(signature = (tokens, errors="replace"))]
        fn decode(&self, tokens: Vec<Token>, errors: &str) -> PyResult<String> {
            Ok(self.tokenizer.decode_with(&tokens, parse_errors(errors)?)?)
        }

        #[pyo3(signature = (token_seqs, errors="replace", show_progress=false))]
        fn decode_batch(
            &self,
            token_seqs: Vec<Vec<Token>>,
            errors: &str,
            show_progress: bool,
        ) -> PyResult<Vec<String>> {
            let seqs: Vec<&[Token]> = token_seqs.iter().map(Vec::as_slice).collect();
            Ok(self
                .tokenizer
                .decode_batch(&seqs, parse_errors(errors)?, show_progress)?)
        }

        fn vocab_size(&self) -> usize {
            self.tokenizer.vocab_size()
        }

        fn get_merge_history(&self) -> Vec<((Token, Token), Token)> {
            self.tokenizer
                .merge_history()
                .into_iter()
                .map(|(pair, tok)| (pair.into(), tok))
                .collect()
        }
    }

    #[pymodule]
    fn _bytebpe(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<RustBasicTokenizer>()?;
        Ok(())
    }
}
