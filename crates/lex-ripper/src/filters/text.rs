//! Built-in pre-filters.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FilterError, TextFilter};

/// Collapse runs of whitespace (including line breaks) into single spaces and
/// trim both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeWhitespace;

impl TextFilter for NormalizeWhitespace {
    fn apply(&self, text: String) -> Result<String, FilterError> {
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn name(&self) -> &str {
        "normalize_whitespace"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseText;

impl TextFilter for LowercaseText {
    fn apply(&self, text: String) -> Result<String, FilterError> {
        Ok(text.to_lowercase())
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}

/// Replace http(s) URLs with a space.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripUrls;

impl TextFilter for StripUrls {
    fn apply(&self, text: String) -> Result<String, FilterError> {
        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("URL pattern is valid"));
        Ok(RE.replace_all(&text, " ").into_owned())
    }

    fn name(&self) -> &str {
        "strip_urls"
    }
}

/// Replace every match of a pattern. `replacement` supports `$1` groups.
#[derive(Debug, Clone)]
pub struct RegexReplace {
    pattern: Regex,
    replacement: String,
}

impl RegexReplace {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, FilterError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| FilterError::new(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }
}

impl TextFilter for RegexReplace {
    fn apply(&self, text: String) -> Result<String, FilterError> {
        Ok(self
            .pattern
            .replace_all(&text, self.replacement.as_str())
            .into_owned())
    }

    fn name(&self) -> &str {
        "regex_replace"
    }
}
