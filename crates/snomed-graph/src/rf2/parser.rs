//! Generic RF2 file parser.
//!
//! Provides a streaming parser for SNOMED CT RF2 tab-delimited files. Every
//! row is checked against the column count of its file type so malformed input
//! fails with the file name and line number.

use std::io::Read;
use std::marker::PhantomData;

use csv::{Reader, ReaderBuilder, StringRecord};
use snomed_model::SctId;
use uuid::Uuid;

use crate::error::{FieldError, GraphError, GraphResult};

/// Trait for types that can be parsed from RF2 records.
pub trait Rf2Record: Sized {
    /// Expected column names for this record type.
    const EXPECTED_COLUMNS: &'static [&'static str];

    /// Parse a record from a CSV StringRecord with the expected column count.
    fn from_record(record: &StringRecord) -> Result<Self, FieldError>;
}

/// A streaming parser for RF2 files.
///
/// Reads record by record; call [`Rf2Parser::last_line`] after a record is
/// returned to learn where it came from.
pub struct Rf2Parser<R: Read, T: Rf2Record> {
    reader: Reader<R>,
    file_name: String,
    records_read: usize,
    last_line: u64,
    _marker: PhantomData<T>,
}

impl<R: Read, T: Rf2Record> Rf2Parser<R, T> {
    /// Creates a new parser from a reader and validates the header row.
    pub fn from_reader(reader: R, file_name: impl Into<String>) -> GraphResult<Self> {
        let file_name = file_name.into();
        let mut csv_reader = rf2_reader(reader);
        validate_headers(&mut csv_reader, &file_name, T::EXPECTED_COLUMNS)?;

        Ok(Self {
            reader: csv_reader,
            file_name,
            records_read: 0,
            last_line: 1,
            _marker: PhantomData,
        })
    }

    /// Returns the number of records read so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Line number of the most recently returned record.
    pub fn last_line(&self) -> u64 {
        self.last_line
    }

    /// Name of the file being parsed.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Builds a parse error for the current line.
    pub fn error_here(&self, message: impl Into<String>) -> GraphError {
        GraphError::Parse {
            file: self.file_name.clone(),
            line: self.last_line,
            message: message.into(),
        }
    }
}

impl<R: Read, T: Rf2Record> Iterator for Rf2Parser<R, T> {
    type Item = GraphResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match next_row(&mut self.reader, &mut record, &self.file_name, T::EXPECTED_COLUMNS.len()) {
            Ok(Some(line)) => {
                self.records_read += 1;
                self.last_line = line;
                Some(T::from_record(&record).map_err(|e| self.error_here(e.to_string())))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Calls `f` with the line number and fields of every row of an RF2 file.
///
/// Used where only a few columns matter and building components would be
/// wasted work.
pub fn for_each_row<R, F>(reader: R, file_name: &str, columns: &[&str], mut f: F) -> GraphResult<usize>
where
    R: Read,
    F: FnMut(u64, &StringRecord) -> GraphResult<()>,
{
    let mut csv_reader = rf2_reader(reader);
    validate_headers(&mut csv_reader, file_name, columns)?;

    let mut record = StringRecord::new();
    let mut count = 0;
    while let Some(line) = next_row(&mut csv_reader, &mut record, file_name, columns.len())? {
        f(line, &record)?;
        count += 1;
    }
    Ok(count)
}

fn rf2_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader)
}

/// Validates that the file has the expected column headers.
fn validate_headers<R: Read>(reader: &mut Reader<R>, file_name: &str, expected: &[&str]) -> GraphResult<()> {
    let header_error = |message: String| GraphError::Parse {
        file: file_name.to_string(),
        line: 1,
        message,
    };

    let headers = reader.headers()?;
    if headers.len() != expected.len() {
        return Err(header_error(format!(
            "invalid header: expected {} columns, found {}",
            expected.len(),
            headers.len()
        )));
    }

    for (i, expected_col) in expected.iter().enumerate() {
        let found = headers.get(i).unwrap_or("");
        // Handle UTF-8 BOM at start of file
        let found = found.trim_start_matches('\u{feff}');
        if found != *expected_col {
            return Err(header_error(format!(
                "unexpected column '{}' at position {}, expected '{}'",
                found, i, expected_col
            )));
        }
    }

    Ok(())
}

/// Reads the next non-empty row, returning its line number.
fn next_row<R: Read>(
    reader: &mut Reader<R>,
    record: &mut StringRecord,
    file_name: &str,
    expected: usize,
) -> GraphResult<Option<u64>> {
    loop {
        if !reader.read_record(record)? {
            return Ok(None);
        }

        // Skip empty records
        if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != expected {
            return Err(GraphError::Parse {
                file: file_name.to_string(),
                line,
                message: format!("expected {} columns, found {}", expected, record.len()),
            });
        }
        return Ok(Some(line));
    }
}

/// Helper functions for parsing RF2 field values.
pub mod parse {
    use super::{FieldError, SctId, StringRecord, Uuid};

    /// Returns field `index`, empty if absent.
    pub fn field(record: &StringRecord, index: usize) -> &str {
        record.get(index).unwrap_or("")
    }

    /// Parses an SCTID from a string.
    pub fn sctid(value: &str) -> Result<SctId, FieldError> {
        value.parse::<u64>().map_err(|_| FieldError::InvalidSctId {
            value: value.to_string(),
        })
    }

    /// Parses a refset member UUID.
    pub fn uuid(value: &str) -> Result<Uuid, FieldError> {
        Uuid::parse_str(value).map_err(|_| FieldError::InvalidUuid {
            value: value.to_string(),
        })
    }

    /// Parses a boolean from "0" or "1". An empty field is unknown.
    pub fn boolean(value: &str) -> Result<Option<bool>, FieldError> {
        match value {
            "" => Ok(None),
            "0" => Ok(Some(false)),
            "1" => Ok(Some(true)),
            _ => Err(FieldError::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Parses an effective time (YYYYMMDD). An empty field is unpublished.
    pub fn effective_time(value: &str) -> Result<Option<u32>, FieldError> {
        if value.is_empty() {
            return Ok(None);
        }
        if value.len() != 8 {
            return Err(FieldError::InvalidDate {
                value: value.to_string(),
            });
        }
        value.parse::<u32>().map(Some).map_err(|_| FieldError::InvalidDate {
            value: value.to_string(),
        })
    }

    /// Parses an integer value.
    pub fn integer<T: std::str::FromStr>(value: &str) -> Result<T, FieldError> {
        value.parse::<T>().map_err(|_| FieldError::InvalidInteger {
            value: value.to_string(),
        })
    }

    /// Parses a metadata concept id and decodes it with `from_id`.
    pub fn code<T>(
        value: &str,
        column: &'static str,
        from_id: impl Fn(SctId) -> Option<T>,
    ) -> Result<T, FieldError> {
        let id = sctid(value)?;
        from_id(id).ok_or(FieldError::UnknownCode { column, value: id })
    }
}
