//! Dictionary loading.
//!
//! A dictionary file is UTF-8 CSV without a header row:
//!
//! ```text
//! # surface,part_of_speech,base_form,reading
//! 東京,noun,東京,トウキョウ
//! ran,verb,run
//! ```
//!
//! `base_form` defaults to the surface and `reading` to empty. Lines starting
//! with `#` are comments.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, RipperError};

/// Lexical information attached to one dictionary surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub part_of_speech: String,
    pub base_form: String,
    pub reading: String,
}

impl DictEntry {
    /// Feature layout carried by tokens: `[pos, base_form, reading]`.
    pub fn features(&self) -> Vec<String> {
        vec![
            self.part_of_speech.clone(),
            self.base_form.clone(),
            self.reading.clone(),
        ]
    }
}

// surface, part of speech, base form
static BUILTIN_ENTRIES: &[(&str, &str, &str)] = &[
    ("a", "determiner", "a"),
    ("an", "determiner", "a"),
    ("the", "determiner", "the"),
    ("this", "determiner", "this"),
    ("that", "determiner", "that"),
    ("and", "conjunction", "and"),
    ("or", "conjunction", "or"),
    ("but", "conjunction", "but"),
    ("of", "preposition", "of"),
    ("in", "preposition", "in"),
    ("on", "preposition", "on"),
    ("at", "preposition", "at"),
    ("to", "preposition", "to"),
    ("for", "preposition", "for"),
    ("with", "preposition", "with"),
    ("from", "preposition", "from"),
    ("by", "preposition", "by"),
    ("i", "pronoun", "i"),
    ("you", "pronoun", "you"),
    ("he", "pronoun", "he"),
    ("she", "pronoun", "she"),
    ("it", "pronoun", "it"),
    ("we", "pronoun", "we"),
    ("they", "pronoun", "they"),
    ("is", "auxiliary", "be"),
    ("are", "auxiliary", "be"),
    ("was", "auxiliary", "be"),
    ("were", "auxiliary", "be"),
    ("be", "auxiliary", "be"),
    ("は", "particle", "は"),
    ("が", "particle", "が"),
    ("を", "particle", "を"),
    ("に", "particle", "に"),
    ("の", "particle", "の"),
    ("で", "particle", "で"),
    ("と", "particle", "と"),
    ("も", "particle", "も"),
    ("です", "auxiliary", "です"),
    ("ます", "auxiliary", "ます"),
    ("、", "symbol", "、"),
    ("。", "symbol", "。"),
];

/// Surface-to-entry lexicon used by the tokenizer.
#[derive(Debug, Clone)]
pub struct Dictionary {
    name: String,
    entries: HashMap<String, DictEntry>,
    /// Longest surface in chars, bounds the longest-match window.
    max_surface_chars: usize,
}

impl Dictionary {
    /// Dictionary with no entries; every word is unknown.
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            entries: HashMap::new(),
            max_surface_chars: 0,
        }
    }

    /// Small function-word lexicon compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_entries(
            "builtin",
            BUILTIN_ENTRIES.iter().map(|(surface, pos, base)| {
                (
                    surface.to_string(),
                    DictEntry {
                        part_of_speech: pos.to_string(),
                        base_form: base.to_string(),
                        reading: String::new(),
                    },
                )
            }),
        )
    }

    /// Build a dictionary from `(surface, entry)` pairs. Later duplicates win.
    pub fn from_entries<I>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, DictEntry)>,
    {
        let entries: HashMap<String, DictEntry> = entries.into_iter().collect();
        let max_surface_chars = entries
            .keys()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
        Self {
            name: name.into(),
            entries,
            max_surface_chars,
        }
    }

    /// Load a dictionary file.
    ///
    /// Fails with [`RipperError::DictionaryLoad`] when the file cannot be
    /// read or a row is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| RipperError::DictionaryLoad {
            path: path.display().to_string(),
            reason,
        };

        let file = std::fs::File::open(path).map_err(|e| load_error(e.to_string()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());

        let dictionary = Self::from_reader(name, file).map_err(load_error)?;
        info!(
            "Loaded dictionary '{}' with {} entries",
            dictionary.name,
            dictionary.len()
        );
        Ok(dictionary)
    }

    /// Parse dictionary rows from any reader.
    pub fn from_reader<R: std::io::Read>(
        name: impl Into<String>,
        reader: R,
    ) -> std::result::Result<Self, String> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in csv_reader.records() {
            let row = row.map_err(|e| e.to_string())?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);

            let surface = row.get(0).unwrap_or_default();
            if surface.is_empty() {
                return Err(format!("line {line}: empty surface"));
            }
            let part_of_speech = row.get(1).unwrap_or_default();
            if part_of_speech.is_empty() {
                return Err(format!("line {line}: missing part of speech for '{surface}'"));
            }
            let base_form = row.get(2).filter(|s| !s.is_empty()).unwrap_or(surface);
            let reading = row.get(3).unwrap_or_default();

            entries.push((
                surface.to_string(),
                DictEntry {
                    part_of_speech: part_of_speech.to_string(),
                    base_form: base_form.to_string(),
                    reading: reading.to_string(),
                },
            ));
        }

        let dictionary = Self::from_entries(name, entries);
        debug!(
            "Parsed {} dictionary entries (longest surface: {} chars)",
            dictionary.len(),
            dictionary.max_surface_chars
        );
        Ok(dictionary)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup, falling back to the lowercase form.
    pub fn lookup(&self, surface: &str) -> Option<&DictEntry> {
        self.entries.get(surface).or_else(|| {
            let lower = surface.to_lowercase();
            if lower == surface {
                None
            } else {
                self.entries.get(&lower)
            }
        })
    }

    /// Longest entry that is a prefix of `text`.
    ///
    /// Returns the matched byte length and the entry.
    pub fn longest_prefix<'a>(&'a self, text: &'a str) -> Option<(usize, &'a DictEntry)> {
        self.prefix_matches(text).next()
    }

    /// Every entry that is a prefix of `text`, longest first.
    ///
    /// Candidates are looked up like [`lookup`](Self::lookup), so `The`
    /// matches an entry for `the`. Yields the matched byte length and the
    /// entry.
    pub fn prefix_matches<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = (usize, &'a DictEntry)> + 'a {
        let ends: Vec<usize> = text
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .filter(|&end| end > 0)
            .take(self.max_surface_chars)
            .collect();

        ends.into_iter()
            .rev()
            .filter_map(move |end| self.lookup(&text[..end]).map(|entry| (end, entry)))
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}
