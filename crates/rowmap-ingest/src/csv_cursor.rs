//! Forward-only row cursor over CSV input.
//!
//! The first record is the header row. Header names are normalized (byte
//! order mark stripped, inner whitespace collapsed). Blank records are
//! skipped. Every cell is read as text; typed conversion happens in the
//! property accessors.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rowmap_model::{CursorError, RowCursor, RowRecord, RowShape, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How CSV cells are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter. Defaults to `,`.
    pub delimiter: u8,
    /// Treat empty cells as `NULL`. Defaults to true.
    pub empty_as_null: bool,
    /// Trim surrounding whitespace from cells. Defaults to true.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            empty_as_null: true,
            trim: true,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_empty_as_null(mut self, enabled: bool) -> Self {
        self.empty_as_null = enabled;
        self
    }

    pub fn with_trim(mut self, enabled: bool) -> Self {
        self.trim = enabled;
        self
    }
}

/// Row cursor reading records from a CSV source.
pub struct CsvCursor<R> {
    reader: csv::Reader<R>,
    shape: RowShape,
    options: CsvOptions,
    record: StringRecord,
    positioned: bool,
    rows: usize,
}

impl<R> std::fmt::Debug for CsvCursor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvCursor")
            .field("shape", &self.shape)
            .field("options", &self.options)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl CsvCursor<File> {
    pub fn from_path(path: &Path, options: CsvOptions) -> Result<Self, CursorError> {
        let reader = builder(options).from_path(path).map_err(csv_error)?;
        let cursor = Self::with_reader(reader, options)?;
        debug!(
            path = %path.display(),
            columns = cursor.shape.len(),
            "opened csv cursor"
        );
        Ok(cursor)
    }
}

impl<R: Read> CsvCursor<R> {
    pub fn from_reader(input: R, options: CsvOptions) -> Result<Self, CursorError> {
        Self::with_reader(builder(options).from_reader(input), options)
    }

    fn with_reader(mut reader: csv::Reader<R>, options: CsvOptions) -> Result<Self, CursorError> {
        let headers = reader.headers().map_err(csv_error)?;
        let shape = RowShape::new(headers.iter().map(normalize_header));
        Ok(Self {
            reader,
            shape,
            options,
            record: StringRecord::new(),
            positioned: false,
            rows: 0,
        })
    }
}

impl<R> CsvCursor<R> {
    /// Data rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows
    }

    /// The cell at `ordinal`, `None` when it reads as `NULL`.
    fn cell(&self, ordinal: usize) -> Result<Option<&str>, CursorError> {
        if !self.positioned {
            return Err(CursorError::NotPositioned);
        }
        if ordinal >= self.shape.len() {
            return Err(CursorError::OrdinalOutOfRange {
                ordinal,
                width: self.shape.len(),
            });
        }
        // Short records read their missing trailing cells as empty.
        let raw = self.record.get(ordinal).unwrap_or("");
        let cell = if self.options.trim {
            raw.trim()
        } else {
            raw
        };
        if self.options.empty_as_null && cell.is_empty() {
            return Ok(None);
        }
        Ok(Some(cell))
    }
}

impl<R: Read> RowRecord for CsvCursor<R> {
    fn shape(&self) -> &RowShape {
        &self.shape
    }

    fn is_null(&self, ordinal: usize) -> bool {
        matches!(self.cell(ordinal), Ok(None))
    }

    fn read(&self, ordinal: usize) -> Result<Value, CursorError> {
        Ok(match self.cell(ordinal)? {
            Some(text) => Value::text(text),
            None => Value::Null,
        })
    }
}

impl<R: Read> RowCursor for CsvCursor<R> {
    fn advance(&mut self) -> Result<bool, CursorError> {
        loop {
            let has_record = self
                .reader
                .read_record(&mut self.record)
                .map_err(csv_error)?;
            if !has_record {
                self.positioned = false;
                return Ok(false);
            }
            if self.record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            self.positioned = true;
            self.rows += 1;
            return Ok(true);
        }
    }
}

fn builder(options: CsvOptions) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter);
    builder
}

fn csv_error(err: csv::Error) -> CursorError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return CursorError::Io(io);
        }
        return CursorError::Malformed {
            message: "csv io error".to_string(),
        };
    }
    CursorError::Malformed {
        message: err.to_string(),
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
