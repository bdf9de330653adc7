//! Dictionary-driven segmentation.

use super::{Dictionary, TokenizeError, Tokenizer};
use crate::types::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharKind {
    Punct,
    /// Letters and digits of scripts that separate words with spaces.
    Spaced,
    /// CJK ideographs and kana, written without spaces.
    Unspaced,
}

fn char_kind(c: char) -> CharKind {
    if is_unspaced_script(c) {
        CharKind::Unspaced
    } else if c.is_alphanumeric() || c == '_' || c == '\'' {
        CharKind::Spaced
    } else {
        CharKind::Punct
    }
}

fn is_unspaced_script(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{FF66}'..='\u{FF9F}' // halfwidth katakana
    )
}

fn is_word_char(c: char) -> bool {
    char_kind(c) == CharKind::Spaced
}

/// True when `surface` would start or end inside a space-separated word.
fn cuts_word(before: Option<char>, surface: &str, after: Option<char>) -> bool {
    let cuts_start = before.is_some_and(is_word_char)
        && surface.chars().next().is_some_and(is_word_char);
    let cuts_end = after.is_some_and(is_word_char)
        && surface.chars().next_back().is_some_and(is_word_char);
    cuts_start || cuts_end
}

/// Longest-match tokenizer over a [`Dictionary`].
///
/// Text is split at whitespace. Within each chunk the longest dictionary
/// entry starting at the current position wins, so entries may mix scripts
/// or contain punctuation (`C++`, `e.g.`, `3月`). An entry never matches
/// part of a space-separated word: `a` does not split `cathedral`.
/// Characters no entry covers are merged into unknown tokens, broken where
/// the character class changes between Latin-style words, CJK/kana and
/// punctuation.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTokenizer {
    max_input_chars: Option<usize>,
}

impl DictionaryTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject texts longer than `limit` characters.
    pub fn with_max_input_chars(limit: usize) -> Self {
        Self {
            max_input_chars: Some(limit),
        }
    }

    fn segment_chunk(tokens: &mut Vec<Token>, chunk: &str, dictionary: &Dictionary) {
        let mut pos = 0;
        // start and class of the pending unknown stretch
        let mut unknown: Option<(usize, CharKind)> = None;

        while pos < chunk.len() {
            let rest = &chunk[pos..];
            let before = chunk[..pos].chars().next_back();
            let matched = dictionary
                .prefix_matches(rest)
                .find(|(len, _)| {
                    !cuts_word(before, &rest[..*len], rest[*len..].chars().next())
                });

            if let Some((len, entry)) = matched {
                if let Some((start, _)) = unknown.take() {
                    tokens.push(Token::unknown(&chunk[start..pos]));
                }
                tokens.push(Token::known(&rest[..len], entry.features()));
                pos += len;
                continue;
            }

            let Some(c) = rest.chars().next() else {
                break;
            };
            let kind = char_kind(c);
            match unknown {
                Some((_, pending)) if pending == kind => {}
                Some((start, _)) => {
                    tokens.push(Token::unknown(&chunk[start..pos]));
                    unknown = Some((pos, kind));
                }
                None => unknown = Some((pos, kind)),
            }
            pos += c.len_utf8();
        }

        if let Some((start, _)) = unknown {
            tokens.push(Token::unknown(&chunk[start..]));
        }
    }
}

impl Tokenizer for DictionaryTokenizer {
    fn tokenize(&self, text: &str, dictionary: &Dictionary) -> Result<Vec<Token>, TokenizeError> {
        if let Some(limit) = self.max_input_chars {
            let count = text.chars().count();
            if count > limit {
                return Err(TokenizeError::new(format!(
                    "text has {count} characters, limit is {limit}"
                )));
            }
        }

        let mut tokens = Vec::new();
        for chunk in text.split_whitespace() {
            Self::segment_chunk(&mut tokens, chunk, dictionary);
        }
        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}
