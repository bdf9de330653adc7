use serde::{Deserialize, Serialize};

/// Ordered column names of a record stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name`, first match wins on duplicate names.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Header with one extra trailing column.
    pub fn with_appended(&self, name: impl Into<String>) -> Self {
        let mut columns = self.columns.clone();
        columns.push(name.into());
        Self { columns }
    }
}

/// One input row: text values aligned with the stream header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Look a value up by column name.
    pub fn field<'a>(&'a self, header: &Header, name: &str) -> Option<&'a str> {
        header.index_of(name).and_then(|i| self.get(i))
    }
}

/// Whether the tokenizer found the token in its dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Known,
    Unknown,
}

/// A unit of tokenized text.
///
/// `features` is opaque to the pipeline. The bundled tokenizer fills it with
/// `[part_of_speech, base_form, reading]` for dictionary hits and leaves it
/// empty for unknown words; filters that understand the layout use the
/// accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub class: TokenClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Token {
    /// Token with no dictionary information.
    pub fn unknown(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            class: TokenClass::Unknown,
            features: Vec::new(),
        }
    }

    pub fn known(surface: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            surface: surface.into(),
            class: TokenClass::Known,
            features,
        }
    }

    pub fn part_of_speech(&self) -> Option<&str> {
        self.feature(0)
    }

    pub fn base_form(&self) -> Option<&str> {
        self.feature(1)
    }

    pub fn reading(&self) -> Option<&str> {
        self.feature(2)
    }

    fn feature(&self, index: usize) -> Option<&str> {
        self.features
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Where the processed text lands in the output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Keep the original column and add a trailing tokenized column.
    #[default]
    Append,
    /// Overwrite the target column in place.
    Replace,
}

impl OutputMode {
    pub fn from_replace_flag(replace: bool) -> Self {
        if replace { Self::Replace } else { Self::Append }
    }
}

/// One output value plus its forced-quoting flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: String,
    pub quoted: bool,
}

/// A fully assembled output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub cells: Vec<Cell>,
}

impl OutputRow {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value.as_str()).collect()
    }
}
