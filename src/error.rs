//! Error types for BPE tokenizer and trainer operations.

use std::{error::Error, fmt, str::FromStr};

use indicatif::style::TemplateError;

use crate::types::{BASE_VOCAB_SIZE, Token, TokenPair};

/// Controls how UTF-8 decoding errors are handled.
///
/// Unknown token IDs always produce errors regardless of mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Fail on invalid UTF-8.
    Strict,
    /// Replace invalid UTF-8 sequences with U+FFFD.
    #[default]
    Replace,
}

impl FromStr for ErrorMode {
    type Err = String;

    /// Parses an error mode string ("strict" or "replace").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "replace" => Ok(Self::Replace),
            _ => Err(format!(
                "invalid error mode: {s:?} (expected \"strict\" or \"replace\")"
            )),
        }
    }
}

/// Errors that can occur when training a tokenizer.
#[derive(Debug)]
pub enum TrainError {
    /// Requested vocabulary cannot hold every byte value.
    VocabSizeTooSmall(usize),
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VocabSizeTooSmall(size) => write!(
                f,
                "vocab size {size} is too small: at least {BASE_VOCAB_SIZE} is required for all byte values"
            ),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for TrainError {}

/// Errors that can occur during text encoding.
#[derive(Debug)]
pub enum EncodeError {
    /// The tokenizer has no merge table yet.
    Untrained,
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untrained => write!(f, "tokenizer must be trained before encoding"),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for EncodeError {}

/// Errors that can occur during token decoding.
#[derive(Debug)]
pub enum DecodeError {
    /// The tokenizer has no vocabulary yet.
    Untrained,
    /// Token ID not found in vocabulary.
    UnknownToken(Token),
    /// Decoded bytes are not valid UTF-8 (strict mode only).
    InvalidUtf8(std::string::FromUtf8Error),
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untrained => write!(f, "tokenizer must be trained before decoding"),
            Self::UnknownToken(t) => write!(f, "unknown token id: {t}"),
            Self::InvalidUtf8(e) => write!(f, "invalid UTF-8 in decoded bytes: {e}"),
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUtf8(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors that can occur when building a tokenizer from a merge list.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenizerInitError {
    /// Merge at `order` does not produce the next consecutive token id.
    NonConsecutiveToken { order: usize, expected: Token, found: Token },
    /// Merge references a token that does not exist yet.
    DanglingToken { pair: TokenPair, token: Token },
    /// The same pair is merged more than once.
    DuplicatePair(TokenPair),
}

impl fmt::Display for TokenizerInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConsecutiveToken {
                order,
                expected,
                found,
            } => write!(
                f,
                "merge {order} produces token {found}, expected {expected}"
            ),
            Self::DanglingToken { pair, token } => write!(
                f,
                "merge ({}, {}) references unknown token {token}",
                pair.0, pair.1
            ),
            Self::DuplicatePair(pair) => {
                write!(f, "pair ({}, {}) is merged more than once", pair.0, pair.1)
            }
        }
    }
}

impl Error for TokenizerInitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mode_from_str() {
        assert_eq!("strict".parse::<ErrorMode>(), Ok(ErrorMode::Strict));
        assert_eq!("replace".parse::<ErrorMode>(), Ok(ErrorMode::Replace));
        assert!("ignore".parse::<ErrorMode>().is_err());
    }

    #[test]
    fn test_default_error_mode_is_replace() {
        assert_eq!(ErrorMode::default(), ErrorMode::Replace);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TrainError::VocabSizeTooSmall(100).to_string(),
            "vocab size 100 is too small: at least 256 is required for all byte values"
        );
        assert_eq!(
            DecodeError::UnknownToken(999).to_string(),
            "unknown token id: 999"
        );
        assert_eq!(
            TokenizerInitError::DuplicatePair(TokenPair(1, 2)).to_string(),
            "pair (1, 2) is merged more than once"
        );
    }
}
