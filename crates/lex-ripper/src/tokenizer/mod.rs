//! Tokenization: the dictionary resource and the tokenizers that use it.
//!
//! The pipeline only relies on the [`Tokenizer`] contract: given text and the
//! active [`Dictionary`], produce an ordered list of [`Token`]s or fail. Two
//! implementations ship with the crate:
//!
//! - [`DictionaryTokenizer`] - longest-match segmentation against the
//!   dictionary, used by default
//! - [`WhitespaceTokenizer`] - plain whitespace splitting, ignores the
//!   dictionary

mod dictionary;
mod segmenter;

pub use dictionary::{DictEntry, Dictionary};
pub use segmenter::DictionaryTokenizer;

use crate::types::Token;

/// Failure reported by a tokenizer for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TokenizeError(String);

impl TokenizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Turns text into tokens using a dictionary.
///
/// Implementations must be deterministic: the same text and dictionary
/// always produce the same tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str, dictionary: &Dictionary) -> Result<Vec<Token>, TokenizeError>;

    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;
}

/// Splits on Unicode whitespace. Every token is [`Token::unknown`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str, _dictionary: &Dictionary) -> Result<Vec<Token>, TokenizeError> {
        Ok(text.split_whitespace().map(Token::unknown).collect())
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
