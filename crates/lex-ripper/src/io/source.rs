use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, RipperError};
use crate::types::{Header, Record};

/// Forward-only, finite stream of records sharing one header.
pub trait RecordSource: Send {
    /// Column names, available before the first record is read.
    fn header(&self) -> &Header;

    /// Next record, or `None` once the stream is exhausted.
    fn next_record(&mut self) -> Result<Option<Record>>;
}

/// CSV reader with a mandatory header row.
///
/// Rows whose field count differs from the header are rejected as read
/// errors.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    header: Header,
    buffer: csv::StringRecord,
    rows_read: u64,
}

impl CsvSource<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RipperError::SourceRead {
            row: 0,
            reason: format!("cannot open '{}': {e}", path.display()),
        })?;
        debug!("Opened input {}", path.display());
        Self::from_reader(file)
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let header = reader
            .headers()
            .map(|h| Header::new(h.iter()))
            .map_err(|e| RipperError::SourceRead {
                row: 0,
                reason: format!("cannot read header: {e}"),
            })?;

        Ok(Self {
            reader,
            header,
            buffer: csv::StringRecord::new(),
            rows_read: 0,
        })
    }
}

impl<R: Read + Send> RecordSource for CsvSource<R> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        let has_row = self
            .reader
            .read_record(&mut self.buffer)
            .map_err(|e| RipperError::SourceRead {
                row: self.rows_read + 1,
                reason: e.to_string(),
            })?;

        if !has_row {
            return Ok(None);
        }

        self.rows_read += 1;
        Ok(Some(Record::new(self.buffer.iter())))
    }
}

/// Records held in memory, yielded in insertion order.
#[derive(Debug, Clone)]
pub struct MemorySource {
    header: Header,
    records: VecDeque<Record>,
}

impl MemorySource {
    pub fn new(header: Header, records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            header,
            records: records.into_iter().collect(),
        }
    }
}

impl RecordSource for MemorySource {
    fn header(&self) -> &Header {
        &self.header
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        Ok(self.records.pop_front())
    }
}
