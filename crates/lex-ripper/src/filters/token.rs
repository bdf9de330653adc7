//! Built-in plugins and post-filters.

use std::collections::HashSet;
use std::path::Path;

use super::{FilterError, TokenFilter};
use crate::error::{Result, ResultExt};
use crate::types::Token;

/// Drop tokens whose surface is in a stop-word set (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Load one word per line; blank lines and `#` comments are skipped.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .context(format!("reading stop words '{}'", path.display()))?;
        Ok(Self::new(
            raw.lines().filter(|line| !line.trim_start().starts_with('#')),
        ))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl TokenFilter for StopWords {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .filter(|t| !self.words.contains(&t.surface.to_lowercase()))
            .collect())
    }

    fn name(&self) -> &str {
        "stopwords"
    }
}

/// Keep only tokens whose part of speech is listed.
///
/// Unknown tokens have no part of speech and are kept only when
/// `keep_unknown` is set.
#[derive(Debug, Clone)]
pub struct KeepPartsOfSpeech {
    parts: HashSet<String>,
    keep_unknown: bool,
}

impl KeepPartsOfSpeech {
    pub fn new<I, S>(parts: I, keep_unknown: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            keep_unknown,
        }
    }
}

impl TokenFilter for KeepPartsOfSpeech {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .filter(|t| match t.part_of_speech() {
                Some(pos) => self.parts.contains(pos),
                None => self.keep_unknown,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "keep_parts_of_speech"
    }
}

/// Drop tokens shorter than `min_chars` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    min_chars: usize,
}

impl MinLength {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl TokenFilter for MinLength {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .filter(|t| t.surface.chars().count() >= self.min_chars)
            .collect())
    }

    fn name(&self) -> &str {
        "min_length"
    }
}

/// Rewrite known tokens to their dictionary base form (`was` -> `be`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseForm;

impl TokenFilter for BaseForm {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .map(|mut t| {
                if let Some(base) = t.base_form().map(str::to_string)
                    && base != t.surface
                {
                    t.surface = base;
                }
                t
            })
            .collect())
    }

    fn name(&self) -> &str {
        "base_form"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl TokenFilter for Uppercase {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .map(|mut t| {
                t.surface = t.surface.to_uppercase();
                t
            })
            .collect())
    }

    fn name(&self) -> &str {
        "uppercase"
    }
}

/// Cut every surface to at most `max_chars` characters.
#[derive(Debug, Clone, Copy)]
pub struct Truncate {
    max_chars: usize,
}

impl Truncate {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl TokenFilter for Truncate {
    fn apply(&self, tokens: Vec<Token>) -> std::result::Result<Vec<Token>, FilterError> {
        Ok(tokens
            .into_iter()
            .map(|mut t| {
                let cut = t.surface.char_indices().nth(self.max_chars).map(|(i, _)| i);
                if let Some(cut) = cut {
                    t.surface.truncate(cut);
                }
                t
            })
            .collect())
    }

    fn name(&self) -> &str {
        "truncate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    fn known(surface: &str, pos: &str, base: &str) -> Token {
        Token::known(
            surface,
            vec![pos.to_string(), base.to_string(), String::new()],
        )
    }

    #[test]
    fn test_stopwords_case_insensitive() {
        let filter = StopWords::new(["Cat", " the "]);
        let out = filter
            .apply(vec![
                Token::unknown("The"),
                Token::unknown("house"),
                Token::unknown("cat"),
            ])
            .unwrap();
        assert_eq!(surfaces(&out), vec!["house"]);
    }

    #[test]
    fn test_stopwords_from_path_skips_comments() {
        let path = std::env::temp_dir().join(format!(
            "lex_ripper_stopwords_{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "# common words\nthe\n\na\n").unwrap();
        let filter = StopWords::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_stopwords_from_missing_path() {
        let err = StopWords::from_path("/no/such/stopwords.txt").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_keep_parts_of_speech() {
        let tokens = vec![
            known("The", "determiner", "the"),
            Token::unknown("cat"),
            known("was", "auxiliary", "be"),
        ];

        let strict = KeepPartsOfSpeech::new(["auxiliary"], false);
        assert_eq!(surfaces(&strict.apply(tokens.clone()).unwrap()), vec!["was"]);

        let lenient = KeepPartsOfSpeech::new(["auxiliary"], true);
        assert_eq!(surfaces(&lenient.apply(tokens).unwrap()), vec!["cat", "was"]);
    }

    #[test]
    fn test_min_length_counts_chars_not_bytes() {
        let out = MinLength::new(2)
            .apply(vec![
                Token::unknown("a"),
                Token::unknown("東京"),
                Token::unknown("の"),
            ])
            .unwrap();
        assert_eq!(surfaces(&out), vec!["東京"]);
    }

    #[test]
    fn test_base_form_rewrites_known_tokens_only() {
        let out = BaseForm
            .apply(vec![known("was", "auxiliary", "be"), Token::unknown("cats")])
            .unwrap();
        assert_eq!(surfaces(&out), vec!["be", "cats"]);
    }

    #[test]
    fn test_truncate_is_char_aware() {
        let out = Truncate::new(3)
            .apply(vec![
                Token::unknown("house"),
                Token::unknown("ox"),
                Token::unknown("東京都庁"),
            ])
            .unwrap();
        assert_eq!(surfaces(&out), vec!["hou", "ox", "東京都"]);
    }

    #[test]
    fn test_uppercase() {
        let out = Uppercase.apply(vec![Token::unknown("cat")]).unwrap();
        assert_eq!(surfaces(&out), vec!["CAT"]);
    }
}
