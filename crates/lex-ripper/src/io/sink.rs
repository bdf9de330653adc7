use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::types::{Header, OutputRow};

/// Destination of output rows.
///
/// Errors are plain IO errors; the ripper attaches the row number.
pub trait RecordSink: Send {
    fn write_header(&mut self, header: &Header) -> std::io::Result<()>;

    fn write_row(&mut self, row: &OutputRow) -> std::io::Result<()>;

    fn flush(&mut self) -> std::io::Result<()>;
}

/// Encode one CSV field.
///
/// Forced fields are always wrapped in double quotes; other fields are quoted
/// only when they contain the delimiter, a quote or a line break. Embedded
/// quotes are doubled.
pub fn encode_field(value: &str, force_quote: bool, delimiter: char) -> Cow<'_, str> {
    let needs_quotes = force_quote
        || value
            .chars()
            .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if !needs_quotes {
        return Cow::Borrowed(value);
    }
    Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
}

/// Delimited writer honoring per-cell forced quoting. Comma by default.
pub struct CsvSink<W: Write> {
    writer: BufWriter<W>,
    delimiter: char,
    line: String,
}

impl CsvSink<File> {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!("Created output {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            delimiter: ',',
            line: String::new(),
        }
    }

    /// Use `delimiter` between fields instead of a comma.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn write_line<'a, I>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        self.line.clear();
        for (i, (value, quoted)) in fields.into_iter().enumerate() {
            if i > 0 {
                self.line.push(self.delimiter);
            }
            self.line
                .push_str(&encode_field(value, quoted, self.delimiter));
        }
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> std::io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn write_header(&mut self, header: &Header) -> std::io::Result<()> {
        self.write_line(header.columns().iter().map(|c| (c.as_str(), false)))
    }

    fn write_row(&mut self, row: &OutputRow) -> std::io::Result<()> {
        self.write_line(row.cells.iter().map(|c| (c.value.as_str(), c.quoted)))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Sink that accepts everything and writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl RecordSink for DiscardSink {
    fn write_header(&mut self, _header: &Header) -> std::io::Result<()> {
        Ok(())
    }

    fn write_row(&mut self, _row: &OutputRow) -> std::io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Captured {
    header: Option<Header>,
    rows: Vec<OutputRow>,
    flushes: usize,
}

/// Sink that keeps rows in memory.
///
/// Clones share the same buffer, so a clone kept by the caller can inspect
/// what the ripper wrote after the original was moved into it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    captured: Arc<Mutex<Captured>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> Option<Header> {
        self.captured.lock().header.clone()
    }

    pub fn rows(&self) -> Vec<OutputRow> {
        self.captured.lock().rows.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.captured.lock().flushes
    }
}

impl RecordSink for MemorySink {
    fn write_header(&mut self, header: &Header) -> std::io::Result<()> {
        self.captured.lock().header = Some(header.clone());
        Ok(())
    }

    fn write_row(&mut self, row: &OutputRow) -> std::io::Result<()> {
        self.captured.lock().rows.push(row.clone());
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.captured.lock().flushes += 1;
        Ok(())
    }
}
