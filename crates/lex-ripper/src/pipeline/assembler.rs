//! Output header and row assembly.
//!
//! Everything here is a pure function of its inputs; no IO happens.

use std::collections::HashSet;

use tracing::warn;

use crate::types::{Cell, Header, OutputMode, OutputRow, Record, Token};

/// Join token surfaces in order with `separator`.
pub fn join_tokens(tokens: &[Token], separator: &str) -> String {
    tokens
        .iter()
        .map(|t| t.surface.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Header written for `input` in the given mode.
///
/// Append mode adds `appended_column` as the last column; replace mode
/// keeps the input header as is.
pub fn output_header(input: &Header, mode: OutputMode, appended_column: &str) -> Header {
    match mode {
        OutputMode::Append => input.with_appended(appended_column),
        OutputMode::Replace => input.clone(),
    }
}

/// Builds output rows for a fixed header, mode and quote set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAssembler {
    target_index: usize,
    mode: OutputMode,
    /// One flag per output column.
    quoted: Vec<bool>,
}

impl RowAssembler {
    /// `quote_columns` are matched against the output header; names that
    /// match nothing are reported and ignored.
    pub fn new(
        output_header: &Header,
        target_index: usize,
        mode: OutputMode,
        quote_columns: &[String],
    ) -> Self {
        let wanted: HashSet<&str> = quote_columns.iter().map(String::as_str).collect();
        let quoted: Vec<bool> = output_header
            .columns()
            .iter()
            .map(|c| wanted.contains(c.as_str()))
            .collect();

        for name in &wanted {
            if output_header.index_of(name).is_none() {
                warn!("Quote column '{}' is not in the output header", name);
            }
        }

        Self {
            target_index,
            mode,
            quoted,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Number of fields every assembled row has.
    pub fn width(&self) -> usize {
        self.quoted.len()
    }

    /// Combine `record` with the processed `text`.
    ///
    /// The record must have the input header's width.
    pub fn assemble(&self, record: &Record, text: String) -> OutputRow {
        let mut values: Vec<String> = record.values().to_vec();
        match self.mode {
            OutputMode::Replace => {
                if let Some(slot) = values.get_mut(self.target_index) {
                    *slot = text;
                }
            }
            OutputMode::Append => values.push(text),
        }

        let cells = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Cell {
                value,
                quoted: self.quoted.get(i).copied().unwrap_or(false),
            })
            .collect();

        OutputRow { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quote(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join_tokens_preserves_order() {
        let tokens = vec![Token::unknown("house"), Token::unknown("cat")];
        assert_eq!(join_tokens(&tokens, " "), "house cat");
        assert_eq!(join_tokens(&tokens, "|"), "house|cat");
        assert_eq!(join_tokens(&[], " "), "");
    }

    #[test]
    fn test_output_header_by_mode() {
        let input = Header::new(["id", "text"]);
        assert_eq!(
            output_header(&input, OutputMode::Append, "text_tokenized").columns(),
            &["id", "text", "text_tokenized"]
        );
        assert_eq!(
            output_header(&input, OutputMode::Replace, "ignored"),
            input
        );
    }

    #[test]
    fn test_replace_mode_overwrites_target() {
        let header = Header::new(["text"]);
        let assembler = RowAssembler::new(&header, 0, OutputMode::Replace, &[]);
        let row = assembler.assemble(&Record::new(["house cat"]), "house cat".to_string());
        assert_eq!(row.values(), vec!["house cat"]);
        assert_eq!(row.len(), header.len());
    }

    #[test]
    fn test_append_mode_keeps_original_and_adds_trailing_field() {
        let input = Header::new(["text", "id"]);
        let out = output_header(&input, OutputMode::Append, "text_tokenized");
        let assembler = RowAssembler::new(&out, 0, OutputMode::Append, &[]);

        let row = assembler.assemble(&Record::new(["house cat", "7"]), "house".to_string());
        assert_eq!(row.values(), vec!["house cat", "7", "house"]);
        assert_eq!(row.len(), assembler.width());
    }

    #[test]
    fn test_quote_flags_follow_listed_columns_only() {
        let input = Header::new(["id", "text"]);
        let out = output_header(&input, OutputMode::Append, "text_tokenized");
        let assembler = RowAssembler::new(
            &out,
            1,
            OutputMode::Append,
            &quote(&["text_tokenized", "missing"]),
        );

        let row = assembler.assemble(&Record::new(["1", "a b"]), "a b".to_string());
        let flags: Vec<bool> = row.cells.iter().map(|c| c.quoted).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let header = Header::new(["text"]);
        let assembler = RowAssembler::new(&header, 0, OutputMode::Replace, &quote(&["text"]));
        let record = Record::new(["x"]);
        assert_eq!(
            assembler.assemble(&record, "y".to_string()),
            assembler.assemble(&record, "y".to_string())
        );
    }
}
